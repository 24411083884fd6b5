pub mod contact;
pub mod device_profile;
pub mod media;

pub use contact::ContactRecord;
pub use device_profile::{DeviceProfile, ATTRIBUTE_KEYS};
pub use media::{MediaRecord, DIMENSIONS_UNKNOWN, DURATION_NONE};
