pub mod defaults;
pub mod reconcile;
pub mod types;

pub use defaults::create_default_parts;
pub use reconcile::reconcile;
pub use types::{
    find_item, find_item_mut, Category, ChoiceOption, ExtraEntry, Item, ItemRef, ItemType,
    ItemValue, Mark, Part, SubAnswer, SubGroup, SubItem,
};
