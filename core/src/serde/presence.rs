//! Required-member presence tracking.

use bitvec::vec::BitVec;

use crate::schema::{MemberSchema, SchemaRef};

/// Tracks which required members of a structure have been observed.
///
/// The strategy is selected from the container's required-member count:
/// no bookkeeping at all for shapes with no required members, a single
/// 64-bit word for up to 64 required members, and a dense bit set above
/// that.
#[derive(Debug)]
pub enum PresenceTracker {
    NoOp,
    Bitfield {
        schema: SchemaRef,
        set: u64,
        expected: u64,
    },
    BitSet {
        schema: SchemaRef,
        set: BitVec,
        required_count: usize,
    },
}

impl PresenceTracker {
    /// Select a presence tracking strategy for a structure schema.
    #[must_use]
    pub fn of(schema: &SchemaRef) -> PresenceTracker {
        let Some(struct_schema) = schema.as_struct() else {
            return PresenceTracker::NoOp;
        };
        match struct_schema.required_member_count {
            0 => PresenceTracker::NoOp,
            1..=64 => PresenceTracker::Bitfield {
                schema: schema.clone(),
                set: 0,
                expected: struct_schema.required_bitfield,
            },
            _ => PresenceTracker::BitSet {
                schema: schema.clone(),
                set: BitVec::repeat(false, schema.members().len()),
                required_count: struct_schema.required_member_count,
            },
        }
    }

    /// Mark a member as present.
    pub fn mark(&mut self, member: &MemberSchema) {
        match self {
            PresenceTracker::NoOp => {}
            PresenceTracker::Bitfield { set, .. } => *set |= member.required_mask,
            PresenceTracker::BitSet { set, .. } => {
                if member.index < set.len() {
                    set.set(member.index, true);
                }
            }
        }
    }

    /// True when every required member has been marked present.
    #[must_use]
    pub fn all_set(&self) -> bool {
        match self {
            PresenceTracker::NoOp => true,
            PresenceTracker::Bitfield { set, expected, .. } => set & expected == *expected,
            PresenceTracker::BitSet {
                schema,
                set,
                required_count,
            } => {
                if set.count_ones() < *required_count {
                    return false;
                }
                schema.members().values().all(|member| {
                    member.as_member().is_none_or(|member| {
                        !member.required_by_validation || set[member.index]
                    })
                })
            }
        }
    }

    /// Names of the required members that are still missing, sorted.
    #[must_use]
    pub fn missing_members(&self) -> Vec<String> {
        let (schema, is_set): (&SchemaRef, Box<dyn Fn(&MemberSchema) -> bool>) = match self {
            PresenceTracker::NoOp => return Vec::new(),
            PresenceTracker::Bitfield { schema, set, .. } => {
                let set = *set;
                (
                    schema,
                    Box::new(move |member: &MemberSchema| set & member.required_mask != 0),
                )
            }
            PresenceTracker::BitSet { schema, set, .. } => {
                let set = set.clone();
                (
                    schema,
                    Box::new(move |member: &MemberSchema| set[member.index]),
                )
            }
        };
        let mut missing: Vec<String> = schema
            .members()
            .iter()
            .filter_map(|(name, member)| {
                let member = member.as_member()?;
                (member.required_by_validation && !is_set(member)).then(|| name.clone())
            })
            .collect();
        missing.sort_unstable();
        missing
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::prelude::{RequiredTrait, STRING};
    use crate::schema::{Schema, ShapeId};
    use crate::traits;

    fn required_struct(member_count: usize) -> SchemaRef {
        let builder = Schema::structure_builder(ShapeId::from("test#Tracked"), traits![]);
        for i in 0..member_count {
            let _ = builder.put_member(&format!("member_{i:03}"), &STRING, traits![RequiredTrait]);
        }
        builder.build()
    }

    #[test]
    fn no_required_members_is_noop() {
        let schema = Schema::structure_builder(ShapeId::from("test#Empty"), traits![])
            .put_member("a", &STRING, traits![])
            .build();
        let tracker = PresenceTracker::of(&schema);
        assert!(matches!(tracker, PresenceTracker::NoOp));
        assert!(tracker.all_set());
        assert!(tracker.missing_members().is_empty());
    }

    #[test]
    fn small_structs_use_the_bitfield_strategy() {
        let schema = required_struct(3);
        let mut tracker = PresenceTracker::of(&schema);
        assert!(matches!(tracker, PresenceTracker::Bitfield { .. }));
        assert!(!tracker.all_set());

        for member in schema.members().values() {
            tracker.mark(member.as_member().unwrap());
        }
        assert!(tracker.all_set());
    }

    #[test]
    fn exactly_64_required_members_stays_on_the_bitfield() {
        let schema = required_struct(64);
        let tracker = PresenceTracker::of(&schema);
        assert!(matches!(tracker, PresenceTracker::Bitfield { .. }));
    }

    #[test]
    fn large_structs_use_the_bitset_strategy() {
        let schema = required_struct(65);
        let mut tracker = PresenceTracker::of(&schema);
        assert!(matches!(tracker, PresenceTracker::BitSet { .. }));
        assert!(!tracker.all_set());

        for member in schema.members().values() {
            tracker.mark(member.as_member().unwrap());
        }
        assert!(tracker.all_set());
    }

    #[test]
    fn reports_missing_members_sorted() {
        let schema = Schema::structure_builder(ShapeId::from("test#Missing"), traits![])
            .put_member("charlie", &STRING, traits![RequiredTrait])
            .put_member("alpha", &STRING, traits![RequiredTrait])
            .put_member("bravo", &STRING, traits![RequiredTrait])
            .build();
        let mut tracker = PresenceTracker::of(&schema);
        tracker.mark(
            schema
                .get_member("bravo")
                .and_then(|m| m.as_member())
                .unwrap(),
        );
        assert_eq!(tracker.missing_members(), ["alpha", "charlie"]);
    }
}
