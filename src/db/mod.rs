pub mod delivery_log;
pub mod inquiries;
