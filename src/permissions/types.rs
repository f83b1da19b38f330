use serde::{Deserialize, Serialize};
use std::fmt;

/// Highest API level that still needs the external storage write permission
pub const LEGACY_STORAGE_MAX_API_LEVEL: u32 = 28;

/// Device permissions the camera session depends on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    Camera,
    RecordAudio,
    WriteExternalStorage,
}

impl Permission {
    /// Platform identifier passed to the permission subsystem
    pub fn identifier(&self) -> &'static str {
        match self {
            Permission::Camera => "android.permission.CAMERA",
            Permission::RecordAudio => "android.permission.RECORD_AUDIO",
            Permission::WriteExternalStorage => "android.permission.WRITE_EXTERNAL_STORAGE",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Permission::Camera => "camera",
            Permission::RecordAudio => "record_audio",
            Permission::WriteExternalStorage => "write_external_storage",
        };
        f.write_str(name)
    }
}

/// Ordered set of permissions required before the camera is started
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionSet {
    permissions: Vec<Permission>,
}

impl PermissionSet {
    /// Required permissions for the given platform API level
    pub fn required(api_level: u32) -> Self {
        let mut permissions = vec![Permission::Camera, Permission::RecordAudio];
        if api_level <= LEGACY_STORAGE_MAX_API_LEVEL {
            permissions.push(Permission::WriteExternalStorage);
        }
        Self { permissions }
    }

    pub fn contains(&self, permission: Permission) -> bool {
        self.permissions.contains(&permission)
    }

    pub fn iter(&self) -> impl Iterator<Item = Permission> + '_ {
        self.permissions.iter().copied()
    }

    pub fn as_slice(&self) -> &[Permission] {
        &self.permissions
    }

    pub fn len(&self) -> usize {
        self.permissions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.permissions.is_empty()
    }
}
