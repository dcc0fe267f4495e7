mod todo_list;
mod user_detail;
mod user_list;

pub use todo_list::TodoListView;
pub use user_detail::UserDetailView;
pub use user_list::UserListView;
