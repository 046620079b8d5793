pub mod fields;
pub mod metadata;
pub mod parser;
pub mod pipeline;
pub mod priority;
pub mod record;
pub mod response_id;
