//! Watch engine: fetching, detection, notification and the poll driver.
mod decode;
mod detect;
mod fetch;
mod message;
mod monitor;
mod notify;
mod sleep;
mod types;

pub use decode::{decode_html, DecodedHtml};
pub use detect::{analyze, detect, flatten_text, Analysis, Keywords, MatchResult};
pub use fetch::{FetchSettings, Fetcher, ReqwestFetcher};
pub use message::{render, MessageContext};
pub use monitor::{Monitor, MonitorConfig, MonitorReport};
pub use notify::{BotIdentity, NotifySettings, Notifier, TelegramNotifier};
pub use sleep::{Sleeper, TokioSleeper};
pub use types::{
    CycleError, FailureKind, FetchError, FetchMetadata, FetchOutput, NotifyError, ParseError,
};
