mod ids;
mod note;
mod tag;
mod view;

pub use ids::{NoteId, ObjectId, ParseObjectIdError, TagId, UserId};
pub use note::{Note, NoteWithLabels, TagCount};
pub use tag::{Tag, normalize_tag_name};
pub use view::{NoteView, TagView};
