pub mod builder;
pub mod sender;
pub mod types;

pub use builder::ReportBuilder;
pub use sender::{
    Delivery, HttpTransport, ReportError, ReportSender, ReportTransport, SendOutcome,
};
pub use types::{Report, WireReport};
