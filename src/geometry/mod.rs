pub mod aabb;
pub mod anisotropy;
pub mod ellipsoid;
pub mod support;
