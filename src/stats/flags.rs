use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

/// Declares the statistic columns once: the struct, its column names in table
/// order, and the element-wise helpers used by both flags and counters.
macro_rules! columns {
    (
        scalars { $( $s:ident => $sname:literal, )* }
        streets { $( $a:ident => [$n1:literal, $n2:literal, $n3:literal], )* }
    ) => {
        /// One value per statistic column. Street columns are indexed by
        /// street number minus one (flop is `[0]`, river is `[2]`).
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
        pub struct Columns<T> {
            $( pub $s: T, )*
            $( pub $a: [T; 3], )*
        }

        pub const COLUMNS: &[&str] = &[ $( $sname, )* $( $n1, $n2, $n3, )* ];

        impl<T> Columns<T> {
            /// Column names paired with their values, in [`COLUMNS`] order.
            pub fn entries(&self) -> Vec<(&'static str, &T)> {
                let mut out = Vec::with_capacity(COLUMNS.len());
                $( out.push(($sname, &self.$s)); )*
                $(
                    for (name, value) in [$n1, $n2, $n3].into_iter().zip(self.$a.iter()) {
                        out.push((name, value));
                    }
                )*
                out
            }

            pub fn zip_mut<U>(&mut self, other: &Columns<U>, mut f: impl FnMut(&mut T, &U)) {
                $( f(&mut self.$s, &other.$s); )*
                $(
                    for (mine, theirs) in self.$a.iter_mut().zip(other.$a.iter()) {
                        f(mine, theirs);
                    }
                )*
            }

            pub fn map<U>(&self, mut f: impl FnMut(&T) -> U) -> Columns<U> {
                Columns {
                    $( $s: f(&self.$s), )*
                    $( $a: [f(&self.$a[0]), f(&self.$a[1]), f(&self.$a[2])], )*
                }
            }
        }
    };
}

columns! {
    scalars {
        street0_vpi_chance => "street0VPIChance",
        street0_vpi => "street0VPI",
        street0_aggr_chance => "street0AggrChance",
        street0_aggr => "street0Aggr",
        street0_tb_chance => "street0TBChance",
        street0_tb_done => "street0TBDone",
        street0_fb_chance => "street0FBChance",
        street0_fb_done => "street0FBDone",
        street0_fold_to_3b_chance => "street0FoldTo3BChance",
        street0_fold_to_3b_done => "street0FoldTo3BDone",
        street0_fold_to_4b_chance => "street0FoldTo4BChance",
        street0_fold_to_4b_done => "street0FoldTo4BDone",
        raise_to_steal_chance => "raiseToStealChance",
        raise_to_steal_done => "raiseToStealDone",
        steal_chance => "stealChance",
        steal_done => "stealDone",
        saw_showdown => "sawShowdown",
        won_when_seen_street1 => "wonWhenSeenStreet1",
        fold_bb_to_steal_chance => "foldBBToStealChance",
        folded_bb_to_steal => "foldedBBToSteal",
        fold_sb_to_steal_chance => "foldSBToStealChance",
        folded_sb_to_steal => "foldedSBToSteal",
    }
    streets {
        seen => ["street1Seen", "street2Seen", "street3Seen"],
        other_raised => ["otherRaisedStreet1", "otherRaisedStreet2", "otherRaisedStreet3"],
        fold_to_other_raised => [
            "foldToOtherRaisedStreet1",
            "foldToOtherRaisedStreet2",
            "foldToOtherRaisedStreet3"
        ],
        cb_chance => ["street1CBChance", "street2CBChance", "street3CBChance"],
        cb_done => ["street1CBDone", "street2CBDone", "street3CBDone"],
        fold_to_cb_chance => [
            "foldToStreet1CBChance",
            "foldToStreet2CBChance",
            "foldToStreet3CBChance"
        ],
        fold_to_cb_done => ["foldToStreet1CBDone", "foldToStreet2CBDone", "foldToStreet3CBDone"],
        check_raise_chance => [
            "street1CheckRaiseChance",
            "street2CheckRaiseChance",
            "street3CheckRaiseChance"
        ],
        check_raise_done => [
            "street1CheckRaiseDone",
            "street2CheckRaiseDone",
            "street3CheckRaiseDone"
        ],
    }
}

impl<T> Columns<T> {
    pub fn get(&self, column: &str) -> Option<&T> {
        self.entries()
            .into_iter()
            .find(|(name, _)| *name == column)
            .map(|(_, value)| value)
    }
}

impl<T: Serialize> Serialize for Columns<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let entries = self.entries();
        let mut map = serializer.serialize_map(Some(entries.len()))?;
        for (name, value) in entries {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Chance and done flags of one player in one hand.
pub type StatFlags = Columns<bool>;

impl StatFlags {
    /// Everything false except the preflop VPIP and aggression chances.
    pub fn initial() -> Self {
        Columns {
            street0_vpi_chance: true,
            street0_aggr_chance: true,
            ..Columns::default()
        }
    }
}

/// Running totals of one aggregation cache row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct CacheRow {
    pub n: u64,
    #[serde(flatten)]
    pub counters: Columns<u64>,
}

impl CacheRow {
    /// Row for a single hand: `n = 1` and every flag as 0 or 1.
    pub fn seed(flags: &StatFlags) -> Self {
        Self {
            n: 1,
            counters: flags.map(|f| u64::from(*f)),
        }
    }

    pub fn add(&mut self, other: &CacheRow) {
        self.n += other.n;
        self.counters.zip_mut(&other.counters, |total, more| *total += *more);
    }

    /// Counter by column name; `n` is accepted too.
    pub fn get(&self, column: &str) -> Option<u64> {
        if column == "n" {
            return Some(self.n);
        }
        self.counters.get(column).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_flags() {
        let flags = StatFlags::initial();
        let set: Vec<&str> = flags
            .entries()
            .into_iter()
            .filter(|(_, v)| **v)
            .map(|(name, _)| name)
            .collect();
        assert_eq!(set, vec!["street0VPIChance", "street0AggrChance"]);
    }

    #[test]
    fn test_column_names_are_unique() {
        let mut names = COLUMNS.to_vec();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), COLUMNS.len(), "duplicate column name");
        assert_eq!(COLUMNS.len(), 49);
    }

    #[test]
    fn test_street_columns_are_indexed_from_flop() {
        let mut flags = StatFlags::initial();
        flags.cb_done[2] = true;
        assert_eq!(flags.get("street3CBDone"), Some(&true));
        assert_eq!(flags.get("street1CBDone"), Some(&false));
        assert_eq!(flags.get("nonsense"), None);
    }

    #[test]
    fn test_cache_row_adds_element_wise() {
        let mut flags = StatFlags::initial();
        flags.steal_chance = true;
        let mut row = CacheRow::seed(&flags);
        flags.steal_done = true;
        row.add(&CacheRow::seed(&flags));

        assert_eq!(row.n, 2);
        assert_eq!(row.get("stealChance"), Some(2));
        assert_eq!(row.get("stealDone"), Some(1));
        assert_eq!(row.get("street0VPI"), Some(0));
        assert_eq!(row.get("n"), Some(2));
    }

    #[test]
    fn test_flags_serialize_with_column_names() {
        let json = serde_json::to_value(StatFlags::initial()).unwrap();
        assert_eq!(json["street0VPIChance"], true);
        assert_eq!(json["foldToStreet2CBDone"], false);
        assert_eq!(json.as_object().map(|o| o.len()), Some(COLUMNS.len()));
    }
}
