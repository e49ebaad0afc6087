//! Canonical station identity.
//!
//! Different lines name the same physical station with different codes, and
//! transfer rules record which codes are the same place. This module folds
//! transfer-linked codes into dense canonical ids so coverage can be tracked
//! in a fixed-width bitset.
//!
//! Linking is transitive: if a rule links A to B and another links B to C,
//! all three codes share one id, no matter which order the lines or rules
//! are given in.

use std::collections::HashMap;

use crate::domain::{Line, StationCode};
use crate::transfers::TransferRules;

/// Dense identifier of a canonical station, in `0..count`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CanonicalId(pub u32);

/// Mapping from raw station codes to canonical ids.
#[derive(Debug, Clone, Default)]
pub struct CanonicalStations {
    ids: HashMap<StationCode, CanonicalId>,
    count: u32,
}

impl CanonicalStations {
    /// Build the mapping for a network.
    ///
    /// Codes linked by transfer rules (directly or transitively) share one
    /// id. Ids are dense and assigned in first-appearance order: lines in
    /// the order given, stations in line order. Codes that appear only in
    /// rules and never on a line receive no id.
    pub fn build(lines: &[Line], rules: &TransferRules) -> Self {
        let mut union = UnionFind::new();

        for line in lines {
            for station in line.stations() {
                union.slot(*station);
            }
        }
        for (origin, target) in rules.code_pairs() {
            union.link(origin, target);
        }

        let mut this = Self::default();
        let mut class_ids: HashMap<usize, CanonicalId> = HashMap::new();
        for line in lines {
            for station in line.stations() {
                if this.ids.contains_key(station) {
                    continue;
                }
                let root = union.root_of(*station);
                let id = *class_ids.entry(root).or_insert_with(|| {
                    let id = CanonicalId(this.count);
                    this.count += 1;
                    id
                });
                this.ids.insert(*station, id);
            }
        }
        this
    }

    /// Build a mapping where every distinct code is its own station, ids in
    /// first-appearance order. Used for graphs loaded from interchange
    /// files, which carry no transfer equivalences.
    pub fn from_codes<I>(codes: I) -> Self
    where
        I: IntoIterator<Item = StationCode>,
    {
        let mut this = Self::default();
        for code in codes {
            this.push_synthetic(code);
        }
        this
    }

    /// Canonical id of a code, if the code belongs to the network.
    pub fn get(&self, code: &StationCode) -> Option<CanonicalId> {
        self.ids.get(code).copied()
    }

    /// Number of distinct canonical stations.
    pub fn count(&self) -> u32 {
        self.count
    }

    /// Allocate a fresh id for a code outside the timetable, such as the
    /// synthesized search source. Returns the existing id if the code is
    /// already mapped.
    pub fn push_synthetic(&mut self, code: StationCode) -> CanonicalId {
        if let Some(id) = self.ids.get(&code) {
            return *id;
        }
        let id = CanonicalId(self.count);
        self.count += 1;
        self.ids.insert(code, id);
        id
    }
}

/// Union-find over station codes with path halving.
#[derive(Default)]
struct UnionFind {
    slots: HashMap<StationCode, usize>,
    parents: Vec<usize>,
}

impl UnionFind {
    fn new() -> Self {
        Self::default()
    }

    fn slot(&mut self, code: StationCode) -> usize {
        if let Some(&s) = self.slots.get(&code) {
            return s;
        }
        let s = self.parents.len();
        self.parents.push(s);
        self.slots.insert(code, s);
        s
    }

    fn find(&mut self, mut s: usize) -> usize {
        while self.parents[s] != s {
            self.parents[s] = self.parents[self.parents[s]];
            s = self.parents[s];
        }
        s
    }

    fn link(&mut self, a: StationCode, b: StationCode) {
        let (sa, sb) = (self.slot(a), self.slot(b));
        let (ra, rb) = (self.find(sa), self.find(sb));
        if ra != rb {
            self.parents[rb] = ra;
        }
    }

    fn root_of(&mut self, code: StationCode) -> usize {
        let s = self.slot(code);
        self.find(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{LineId, TrainRun};
    use crate::transfers::TransferTarget;

    fn code(s: &str) -> StationCode {
        StationCode::parse(s).unwrap()
    }

    fn make_line(id: &str, stations: &[&str]) -> Line {
        Line::new(
            LineId::parse(id).unwrap(),
            stations.iter().map(|s| code(s)).collect(),
            vec![TrainRun::from_stops(vec![None; stations.len()])],
        )
        .unwrap()
    }

    fn rule(rules: &mut TransferRules, from_line: &str, from: &str, to_line: &str, to: &str) {
        rules.add(
            LineId::parse(from_line).unwrap(),
            code(from),
            TransferTarget {
                line: LineId::parse(to_line).unwrap(),
                station: code(to),
                minutes: 0,
            },
        );
    }

    #[test]
    fn unlinked_codes_get_distinct_dense_ids() {
        let lines = vec![make_line("R_a", &["R1", "R2", "R3"])];
        let canon = CanonicalStations::build(&lines, &TransferRules::new());

        assert_eq!(canon.count(), 3);
        assert_eq!(canon.get(&code("R1")), Some(CanonicalId(0)));
        assert_eq!(canon.get(&code("R2")), Some(CanonicalId(1)));
        assert_eq!(canon.get(&code("R3")), Some(CanonicalId(2)));
    }

    #[test]
    fn linked_codes_share_an_id() {
        let lines = vec![
            make_line("R_a", &["R1", "R2"]),
            make_line("G_a", &["G1", "G2"]),
        ];
        let mut rules = TransferRules::new();
        rule(&mut rules, "R_a", "R2", "G_a", "G1");

        let canon = CanonicalStations::build(&lines, &rules);

        assert_eq!(canon.count(), 3);
        assert_eq!(canon.get(&code("R2")), canon.get(&code("G1")));
        assert_ne!(canon.get(&code("R1")), canon.get(&code("G2")));
    }

    #[test]
    fn linking_is_transitive_across_rules() {
        // Diamond: A links B, C links D, and B links C. All four codes are
        // one station however the rules are ordered.
        let lines = vec![
            make_line("R_a", &["A1"]),
            make_line("G_a", &["B1"]),
            make_line("BL_a", &["C1"]),
            make_line("O_a", &["D1"]),
        ];

        let orderings: [&[(&str, &str, &str, &str)]; 3] = [
            &[
                ("R_a", "A1", "G_a", "B1"),
                ("BL_a", "C1", "O_a", "D1"),
                ("G_a", "B1", "BL_a", "C1"),
            ],
            &[
                ("G_a", "B1", "BL_a", "C1"),
                ("R_a", "A1", "G_a", "B1"),
                ("BL_a", "C1", "O_a", "D1"),
            ],
            &[
                ("BL_a", "C1", "O_a", "D1"),
                ("G_a", "B1", "BL_a", "C1"),
                ("R_a", "A1", "G_a", "B1"),
            ],
        ];

        for links in orderings {
            let mut rules = TransferRules::new();
            for (fl, f, tl, t) in links {
                rule(&mut rules, fl, f, tl, t);
            }
            let canon = CanonicalStations::build(&lines, &rules);

            assert_eq!(canon.count(), 1);
            let id = canon.get(&code("A1"));
            assert_eq!(canon.get(&code("B1")), id);
            assert_eq!(canon.get(&code("C1")), id);
            assert_eq!(canon.get(&code("D1")), id);
        }
    }

    #[test]
    fn line_order_does_not_change_classes() {
        let make = |swap: bool| {
            let mut lines = vec![
                make_line("R_a", &["R1", "X1"]),
                make_line("G_a", &["G1", "X2"]),
            ];
            if swap {
                lines.reverse();
            }
            let mut rules = TransferRules::new();
            rule(&mut rules, "R_a", "X1", "G_a", "X2");
            CanonicalStations::build(&lines, &rules)
        };

        let forward = make(false);
        let reversed = make(true);

        assert_eq!(forward.count(), reversed.count());
        // Classes agree even though dense ids are assigned in a different
        // first-appearance order.
        assert_eq!(
            forward.get(&code("X1")) == forward.get(&code("X2")),
            reversed.get(&code("X1")) == reversed.get(&code("X2"))
        );
        assert!(forward.get(&code("X1")) == forward.get(&code("X2")));
    }

    #[test]
    fn unknown_code_is_none() {
        let lines = vec![make_line("R_a", &["R1"])];
        let canon = CanonicalStations::build(&lines, &TransferRules::new());
        assert_eq!(canon.get(&code("Z9")), None);
    }

    #[test]
    fn rule_only_codes_get_no_id() {
        let lines = vec![make_line("R_a", &["R1"])];
        let mut rules = TransferRules::new();
        rule(&mut rules, "R_a", "R1", "G_a", "G9");

        let canon = CanonicalStations::build(&lines, &rules);
        assert_eq!(canon.count(), 1);
        assert_eq!(canon.get(&code("G9")), None);
    }

    #[test]
    fn synthetic_extends_the_range() {
        let lines = vec![make_line("R_a", &["R1", "R2"])];
        let mut canon = CanonicalStations::build(&lines, &TransferRules::new());

        let id = canon.push_synthetic(code("source"));
        assert_eq!(id, CanonicalId(2));
        assert_eq!(canon.count(), 3);

        // Idempotent for an already-known code.
        assert_eq!(canon.push_synthetic(code("source")), id);
        assert_eq!(canon.count(), 3);
    }

    #[test]
    fn shared_code_across_lines_is_one_station() {
        let lines = vec![
            make_line("R_a", &["R1", "R2"]),
            make_line("R_b", &["R2", "R1"]),
        ];
        let canon = CanonicalStations::build(&lines, &TransferRules::new());
        assert_eq!(canon.count(), 2);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use crate::domain::{LineId, TrainRun};
    use crate::transfers::TransferTarget;
    use proptest::prelude::*;

    fn code_for(i: usize) -> StationCode {
        StationCode::parse(&format!("S{i}")).unwrap()
    }

    /// Partition 0..n into singleton lines and link random code pairs;
    /// the resulting classes must match a reference reachability check,
    /// under any permutation of the line order.
    proptest! {
        #[test]
        fn classes_match_reachability(
            n in 2usize..12,
            raw_links in prop::collection::vec((0usize..12, 0usize..12), 0..10),
            seed in any::<u64>(),
        ) {
            let links: Vec<(usize, usize)> = raw_links
                .into_iter()
                .map(|(a, b)| (a % n, b % n))
                .collect();

            let mut order: Vec<usize> = (0..n).collect();
            // Cheap deterministic shuffle from the seed.
            for i in (1..n).rev() {
                let j = (seed as usize).wrapping_mul(i + 1) % (i + 1);
                order.swap(i, j);
            }

            let lines: Vec<Line> = order
                .iter()
                .map(|&i| {
                    Line::new(
                        LineId::parse(&format!("L{i}_a")).unwrap(),
                        vec![code_for(i)],
                        vec![TrainRun::from_stops(vec![None])],
                    )
                    .unwrap()
                })
                .collect();

            let mut rules = TransferRules::new();
            for &(a, b) in &links {
                rules.add(
                    LineId::parse(&format!("L{a}_a")).unwrap(),
                    code_for(a),
                    TransferTarget {
                        line: LineId::parse(&format!("L{b}_a")).unwrap(),
                        station: code_for(b),
                        minutes: 0,
                    },
                );
            }

            let canon = CanonicalStations::build(&lines, &rules);

            // Reference: undirected reachability over the links.
            let mut reach: Vec<Vec<bool>> = (0..n)
                .map(|i| (0..n).map(|j| i == j).collect())
                .collect();
            for &(a, b) in &links {
                reach[a][b] = true;
                reach[b][a] = true;
            }
            for k in 0..n {
                for i in 0..n {
                    for j in 0..n {
                        if reach[i][k] && reach[k][j] {
                            reach[i][j] = true;
                        }
                    }
                }
            }

            for i in 0..n {
                for j in 0..n {
                    let same = canon.get(&code_for(i)) == canon.get(&code_for(j));
                    prop_assert_eq!(
                        same, reach[i][j],
                        "codes {} and {} disagree with reachability", i, j
                    );
                }
            }

            // Ids are dense.
            let max = (0..n)
                .filter_map(|i| canon.get(&code_for(i)))
                .map(|id| id.0)
                .max()
                .unwrap_or(0);
            prop_assert_eq!(max + 1, canon.count());
        }
    }
}
