pub mod delivery_log;
pub mod inquiry;

pub use delivery_log::DeliveryLog;
pub use inquiry::Inquiry;
