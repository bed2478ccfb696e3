//! Terminal widgets for the orderchat panel.
//!
//! - `widgets` - chat log, draft input, alert dialog, header, footer
//! - `theme` - colors and styles
//! - `utils` - width-aware wrapping and truncation
//!
//! Widgets take plain structs, not domain rows: the application maps its
//! rendered messages into [`ChatBubble`]s.

pub mod theme;
pub mod utils;
pub mod widgets;

pub use theme::Theme;
pub use utils::{display_width, truncate, wrap_text, wrap_text_indented};
pub use widgets::chat::{BubbleSide, ChatBubble, ChatWidget};
pub use widgets::dialogs::{centered_rect, AlertDialog, InputField};
pub use widgets::footer::Footer;
pub use widgets::header::{Header, HeaderStat, StatusIndicator};
