//! # Pipeline Tests
//!
//! End-to-end checks of the relation pipeline, grouped by component.

use relata_core::{
    Aggregator, IncomingRelations, Link, MultiSearchPlan, MultiSearchResponse, PanelConfig,
    Record, RelationType, Relations, parse_columns, project,
};

// =============================================================================
// RECONCILIATION
// =============================================================================

mod reconciliation {
    use super::*;

    /// siblings [1,2] + associated [2,3] => siblings [1,2,3], associated empty.
    #[test]
    fn siblings_absorb_associated() {
        let mut incoming = IncomingRelations::new();
        incoming.insert(
            RelationType::Siblings,
            Some(vec![Link::new("1"), Link::new("2")]),
        );
        incoming.insert(
            RelationType::Associated,
            Some(vec![Link::new("2"), Link::new("3")]),
        );

        let mut relations = Relations::new();
        let found = Aggregator::new().aggregate(&mut relations, incoming);

        let siblings: Vec<_> = relations[&RelationType::Siblings]
            .iter()
            .filter_map(|l| l.attribute("id"))
            .collect();
        assert!(found);
        assert_eq!(siblings, vec!["1", "2", "3"]);
        assert!(relations[&RelationType::Associated].is_empty());
    }
}

// =============================================================================
// EMPTY VS. ABSENT
// =============================================================================

mod empty_vs_absent {
    use super::*;

    /// A requested type with no entries is an empty group; an unrequested one is absent.
    #[test]
    fn requested_empty_group_is_present() {
        let config = PanelConfig::new("children");
        let mut incoming = IncomingRelations::new();
        for t in config.relation_types() {
            incoming.insert(t, Some(vec![]));
        }

        let mut relations = Relations::new();
        let found = config
            .aggregator()
            .expect("aggregator")
            .aggregate(&mut relations, incoming);

        assert!(!found);
        assert_eq!(relations.get(&RelationType::Children), Some(&vec![]));
        assert_eq!(relations.get(&RelationType::Services), None);
    }
}

// =============================================================================
// BATCH REASSEMBLY
// =============================================================================

mod batch_reassembly {
    use super::*;
    use relata_core::msearch::{Hit, SubResponse};

    /// 2 records x 3 types: every sub-result lands on its own (record, type) pair.
    #[test]
    fn sub_results_map_back_to_their_pairs() {
        let records = vec![Record::new("1", "u1"), Record::new("2", "u2")];
        let types = vec![
            RelationType::Children,
            RelationType::Services,
            RelationType::Siblings,
        ];
        let plan = MultiSearchPlan::build(&records, &types);

        // Tag every hit with the pair it was planned for.
        let responses = plan
            .entries()
            .iter()
            .map(|e| {
                let tag = format!("{}/{}", e.uuid, e.relation_type);
                SubResponse::with_hits(vec![Hit::new(&tag, &tag)])
            })
            .collect();

        let related = plan
            .reassemble(MultiSearchResponse { responses })
            .expect("reassemble");

        assert_eq!(related.len(), 2);
        for record in &records {
            let groups = &related[&record.uuid];
            assert_eq!(groups.len(), 3);
            for t in &types {
                let links = groups[t].as_ref().expect("links");
                assert_eq!(
                    links[0].attribute("id"),
                    Some(format!("{}/{}", record.uuid, t).as_str())
                );
            }
        }
    }

    /// Swapping two sub-results swaps exactly their two pairs.
    #[test]
    fn swapped_sub_results_follow_their_position() {
        let records = vec![Record::new("1", "u1"), Record::new("2", "u2")];
        let types = vec![
            RelationType::Children,
            RelationType::Services,
            RelationType::Siblings,
        ];
        let plan = MultiSearchPlan::build(&records, &types);
        let tags: Vec<String> = plan
            .entries()
            .iter()
            .map(|e| format!("{}/{}", e.uuid, e.relation_type))
            .collect();

        let (first, second) = (1, tags.len() - 2);
        let mut responses: Vec<SubResponse> = tags
            .iter()
            .map(|tag| SubResponse::with_hits(vec![Hit::new(tag, tag)]))
            .collect();
        responses.swap(first, second);

        let related = plan
            .reassemble(MultiSearchResponse { responses })
            .expect("reassemble");

        for (i, entry) in plan.entries().iter().enumerate() {
            let expected = match i {
                i if i == first => &tags[second],
                i if i == second => &tags[first],
                _ => &tags[i],
            };
            let links = related[&entry.uuid][&entry.relation_type]
                .as_ref()
                .expect("links");
            assert_eq!(links[0].attribute("id"), Some(expected.as_str()), "entry {i}");
        }
        assert_ne!(tags[first], tags[second]);
    }

    /// Pairs without hits stay absent, the others are filled.
    #[test]
    fn sparse_hits_leave_other_pairs_absent() {
        let records = vec![Record::new("1", "u1"), Record::new("2", "u2")];
        let types = vec![RelationType::Children, RelationType::Services];
        let plan = MultiSearchPlan::build(&records, &types);

        let responses = plan
            .entries()
            .iter()
            .map(|e| {
                if e.uuid == "u2" && e.relation_type == RelationType::Services {
                    SubResponse::with_hits(vec![Hit::new("svc", "WMS service")])
                } else {
                    SubResponse::with_hits(vec![])
                }
            })
            .collect();

        let related = plan
            .reassemble(MultiSearchResponse { responses })
            .expect("reassemble");

        assert_eq!(related["u1"][&RelationType::Children], None);
        assert_eq!(related["u1"][&RelationType::Services], None);
        assert_eq!(related["u2"][&RelationType::Children], None);
        assert_eq!(
            related["u2"][&RelationType::Services]
                .as_ref()
                .map(|l| l[0].display_title("eng").to_string()),
            Some("WMS service".to_string())
        );
    }
}

// =============================================================================
// TABLE PROJECTION
// =============================================================================

mod table_projection {
    use super::*;

    /// ["Banana", "apple"] sorts with apple first.
    #[test]
    fn locale_sort_is_case_insensitive() {
        let records = vec![
            Record::new("1", "u1").with_field("resourceTitle", "Banana"),
            Record::new("2", "u2").with_field("resourceTitle", "apple"),
        ];
        let rows = project(&records, &parse_columns("resourceTitle")).expect("project");

        let titles: Vec<_> = rows.iter().filter_map(|r| r.cells[0].as_str()).collect();
        assert_eq!(titles, vec!["apple", "Banana"]);
    }
}
