mod binder;

pub use binder::SessionBinder;
