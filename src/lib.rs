pub mod cli;
pub mod error;
pub mod import;
pub mod parser;
pub mod registry;
pub mod schema;
pub mod ui;
pub mod writer;

pub use cli::{Cli, Commands};
pub use error::{ImportError, ImportResult};
pub use import::{import_file, import_reader, ImportOptions, ImportSummary};
pub use ui::{LogUi, Phase, SilentUi, Ui, UiApp};
