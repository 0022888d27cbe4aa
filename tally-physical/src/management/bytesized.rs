//! This module defines the trait [ByteSized],
//! which should be implemented by types that can
//! calculate their own size.

use std::mem::size_of;

use crate::{datavalues::DataValue, tabular::GroupKey};

/// Objects that are able calculate their current approximate size in bytes.
///
/// We use `u64` rather than `usize` here to avoid overflows in case of overestimations.
pub trait ByteSized {
    /// Return the number of bytes this object consumes
    fn size_bytes(&self) -> u64;
}

/// Estimates the memory required for managing the content of a Hashbrown hashset using only
/// the direct size of its elements, without taking into accont any data they might point to.
///
/// The computation is approximate since the hashset does not provide access to its current bucket
/// structure and control byte overhead, so we merely consider the reported capacity.
pub(crate) fn size_inner_hashset_flat<T>(object: &hashbrown::HashSet<T>) -> u64 {
    object.capacity() as u64 * (size_of::<T>() as u64 + 1)
}

/// Estimates the memory required for one entry of a Hashbrown hashmap using only
/// the direct size of key and value, including the control byte.
pub(crate) fn size_hashmap_entry_flat<K, V>() -> u64 {
    size_of::<(K, V)>() as u64 + 1
}

/// Computes the memory required for managing the content of a vector using only
/// the direct size of content objects, without taking into accont any data they might point to.
pub(crate) fn size_inner_vec_flat<T>(object: &Vec<T>) -> u64 {
    object.capacity() as u64 * size_of::<T>() as u64
}

impl ByteSized for DataValue {
    fn size_bytes(&self) -> u64 {
        let inner = match self {
            DataValue::Null | DataValue::Boolean(_) | DataValue::Integer(_) | DataValue::Double(_) => 0,
            DataValue::String(string) => string.capacity() as u64,
            DataValue::List(values) => {
                size_inner_vec_flat(values)
                    + values
                        .iter()
                        .map(|value| value.size_bytes() - size_of::<DataValue>() as u64)
                        .sum::<u64>()
            }
        };

        size_of::<DataValue>() as u64 + inner
    }
}

impl ByteSized for GroupKey {
    fn size_bytes(&self) -> u64 {
        size_of::<GroupKey>() as u64
            + self
                .values()
                .iter()
                .map(ByteSized::size_bytes)
                .sum::<u64>()
    }
}

#[cfg(test)]
mod test {
    use std::mem::size_of;

    use super::ByteSized;
    use crate::datavalues::DataValue;
    use test_log::test;

    #[test]
    fn strings_count_their_heap_part() {
        let value = DataValue::String(String::with_capacity(100));

        assert_eq!(value.size_bytes(), size_of::<DataValue>() as u64 + 100);
        assert_eq!(DataValue::Integer(5).size_bytes(), size_of::<DataValue>() as u64);
    }
}
