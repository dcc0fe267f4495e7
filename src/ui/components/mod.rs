mod command_input;
mod confirm;
mod debounce;
mod input;
mod key_result;
mod search_input;
mod user_picker;

pub use command_input::{CommandEvent, CommandInput};
pub use confirm::{ConfirmDialog, ConfirmEvent};
pub use debounce::Debouncer;
pub use input::{InputResult, TextInput};
pub use key_result::KeyResult;
pub use search_input::{SearchEvent, SearchInput};
pub use user_picker::{UserPicker, UserPickerEvent};
