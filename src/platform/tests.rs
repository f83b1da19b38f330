use super::*;

fn cameras() -> Vec<CameraInfo> {
    vec![
        CameraInfo {
            id: "0".to_string(),
            lens_facing: LensFacing::Front,
            supported_qualities: vec![Quality::Sd],
        },
        CameraInfo {
            id: "1".to_string(),
            lens_facing: LensFacing::Back,
            supported_qualities: vec![Quality::Sd, Quality::Fhd],
        },
    ]
}

#[test]
fn test_default_back_selector_picks_back_camera() {
    let cameras = cameras();
    let selected = CameraSelector::DEFAULT_BACK_CAMERA.select(&cameras).unwrap();
    assert_eq!(selected.id, "1");

    let front_only = vec![cameras[0].clone()];
    assert!(CameraSelector::DEFAULT_BACK_CAMERA
        .select(&front_only)
        .is_none());
}

#[test]
fn test_surface_handles_are_unique() {
    let a = SurfaceHandle::new(640, 480);
    let b = SurfaceHandle::new(640, 480);
    assert_ne!(a.id, b.id);
}

#[test]
fn test_record_event_recording_id() {
    let id = RecordingId::new();
    let event = RecordEvent::Finalize {
        recording: id,
        result: Err(crate::error::CaptureError::SourceInactive),
    };
    assert_eq!(event.recording(), id);
}

#[cfg(feature = "simulated")]
mod simulated {
    use super::super::*;
    use crate::config::AppConfig;
    use crate::error::{BindingError, CaptureError};
    use crate::storage::{FileMediaStore, OutputTargetFactory};
    use std::time::Duration;
    use tokio::sync::mpsc;
    use tokio::time::timeout;

    struct Fixture {
        camera: SimulatedCamera,
        provider: Arc<dyn CameraProvider>,
        targets: OutputTargetFactory,
        scope: LifecycleScope,
        _dir: tempfile::TempDir,
    }

    async fn fixture(edit: impl FnOnce(&mut AppConfig)) -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let mut config = AppConfig::default();
        config.camera.photo_resolution = (64, 48);
        config.camera.frame_rate = 50;
        edit(&mut config);

        let store = Arc::new(FileMediaStore::new(dir.path()));
        let camera = SimulatedCamera::new(config.camera.clone(), store);
        let provider = camera.acquire().await.unwrap();
        Fixture {
            camera,
            provider,
            targets: OutputTargetFactory::new(&config.storage, config.platform.api_level),
            scope: LifecycleScope::new("test"),
            _dir: dir,
        }
    }

    fn group(provider: &Arc<dyn CameraProvider>) -> UseCaseGroup {
        UseCaseGroup {
            preview: provider.create_preview(&SurfaceHandle::new(640, 480)),
            photo: provider.create_image_capture(ImageCaptureSettings::default()),
            video: provider.create_video_capture(QualitySelector::highest_with_sd_floor()),
        }
    }

    #[tokio::test]
    async fn test_bind_resolves_highest_quality() {
        let f = fixture(|_| {}).await;
        let bound = f
            .provider
            .bind(&f.scope, &CameraSelector::DEFAULT_BACK_CAMERA, group(&f.provider))
            .unwrap();

        assert_eq!(bound.camera.lens_facing, LensFacing::Back);
        assert_eq!(bound.video_quality, Quality::Fhd);
        assert_eq!(f.provider.bound_session_count(), 1);
    }

    #[tokio::test]
    async fn test_bind_without_unbind_stacks_sessions() {
        let f = fixture(|_| {}).await;
        let selector = CameraSelector::DEFAULT_BACK_CAMERA;
        f.provider.bind(&f.scope, &selector, group(&f.provider)).unwrap();
        f.provider.bind(&f.scope, &selector, group(&f.provider)).unwrap();
        assert_eq!(f.provider.bound_session_count(), 2);

        f.provider.unbind_all();
        assert_eq!(f.provider.bound_session_count(), 0);
        // Unbinding with nothing bound is harmless
        f.provider.unbind_all();
        assert_eq!(f.camera.stats().unbinds, 1);
    }

    #[tokio::test]
    async fn test_bind_fails_without_back_camera() {
        let f = fixture(|c| c.camera.lenses = vec![LensFacing::Front]).await;
        let err = f
            .provider
            .bind(&f.scope, &CameraSelector::DEFAULT_BACK_CAMERA, group(&f.provider))
            .unwrap_err();
        assert!(matches!(err, BindingError::NoMatchingCamera { .. }));
        assert_eq!(f.provider.bound_session_count(), 0);
    }

    #[tokio::test]
    async fn test_bind_fails_after_scope_end() {
        let f = fixture(|_| {}).await;
        f.scope.end();
        let err = f
            .provider
            .bind(&f.scope, &CameraSelector::DEFAULT_BACK_CAMERA, group(&f.provider))
            .unwrap_err();
        assert!(matches!(err, BindingError::BindFailed { .. }));
    }

    #[tokio::test]
    async fn test_photo_requires_binding_and_writes_jpeg() {
        let f = fixture(|_| {}).await;
        let use_cases = group(&f.provider);
        let photo = Arc::clone(&use_cases.photo);

        let err = photo.take_picture(f.targets.photo()).await.unwrap_err();
        assert_eq!(err, CaptureError::NotBound);

        f.provider
            .bind(&f.scope, &CameraSelector::DEFAULT_BACK_CAMERA, use_cases)
            .unwrap();
        let location = photo.take_picture(f.targets.photo()).await.unwrap();

        let bytes = tokio::fs::read(&location.path).await.unwrap();
        assert_eq!(&bytes[..2], &[0xFF, 0xD8]);
        assert_eq!(f.camera.stats().photos_taken, 1);
    }

    #[tokio::test]
    async fn test_recording_emits_start_then_finalize() {
        let f = fixture(|_| {}).await;
        let use_cases = group(&f.provider);
        let video = Arc::clone(&use_cases.video);
        f.provider
            .bind(&f.scope, &CameraSelector::DEFAULT_BACK_CAMERA, use_cases)
            .unwrap();

        let (tx, mut rx) = mpsc::unbounded_channel();
        let recording = video
            .start_recording(
                RecordingRequest {
                    target: f.targets.video(),
                    with_audio: false,
                },
                tx.clone(),
            )
            .unwrap();
        assert!(!recording.has_audio());

        let second = video.start_recording(
            RecordingRequest {
                target: f.targets.video(),
                with_audio: true,
            },
            tx,
        );
        assert!(matches!(second, Err(CaptureError::RecordingActive)));

        let first = timeout(Duration::from_secs(2), rx.recv()).await.unwrap().unwrap();
        assert_eq!(
            first,
            RecordEvent::Start {
                recording: recording.id()
            }
        );

        recording.stop();
        loop {
            let event = timeout(Duration::from_secs(2), rx.recv()).await.unwrap().unwrap();
            if let RecordEvent::Finalize { result, .. } = event {
                let location = result.unwrap();
                let contents = tokio::fs::read_to_string(&location.path).await.unwrap();
                assert!(contents.contains("audio=false"));
                assert!(contents.contains("quality=FHD"));
                break;
            }
        }
        assert_eq!(f.camera.stats().last_recording_audio, Some(false));
    }

    #[tokio::test]
    async fn test_unbind_interrupts_recording() {
        let f = fixture(|_| {}).await;
        let use_cases = group(&f.provider);
        let video = Arc::clone(&use_cases.video);
        f.provider
            .bind(&f.scope, &CameraSelector::DEFAULT_BACK_CAMERA, use_cases)
            .unwrap();

        let (tx, mut rx) = mpsc::unbounded_channel();
        let recording = video
            .start_recording(
                RecordingRequest {
                    target: f.targets.video(),
                    with_audio: true,
                },
                tx,
            )
            .unwrap();

        f.provider.unbind_all();
        loop {
            let event = timeout(Duration::from_secs(2), rx.recv()).await.unwrap().unwrap();
            if let RecordEvent::Finalize { recording: id, result } = event {
                assert_eq!(id, recording.id());
                assert_eq!(result, Err(CaptureError::SourceInactive));
                break;
            }
        }
    }

    #[tokio::test]
    async fn test_shutdown_stops_worker() {
        let f = fixture(|_| {}).await;
        assert!(f.camera.worker_running());
        f.camera.shutdown();
        assert!(!f.camera.worker_running());
    }
}
