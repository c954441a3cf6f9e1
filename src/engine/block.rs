//! Nested configuration blocks

/// A nested block that must carry at least one attribute once present
pub trait Block {
    fn is_empty(&self) -> bool;
}

/// An entry of a list of blocks identified by a name
pub trait Keyed {
    fn key(&self) -> &str;

    /// New entry holding only its key
    fn with_key(key: &str) -> Self;
}

/// Entry of `list` whose key is `key`, appended if missing
pub fn find_or_create<'a, T: Keyed>(list: &'a mut Vec<T>, key: &str) -> &'a mut T {
    match list.iter().position(|entry| entry.key() == key) {
        Some(index) => &mut list[index],
        None => {
            list.push(T::with_key(key));
            let last = list.len() - 1;
            &mut list[last]
        }
    }
}
