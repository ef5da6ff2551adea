//! Property tests for the recency-priority merge and the
//! mandatory-field validator

use proptest::prelude::*;
use salesflow_workflow_engine::extraction::{
    ContactInformation, Extraction, ShipmentDetails, ShipmentType, TimelineInformation,
};
use salesflow_workflow_engine::merge_with_recency_priority;
use salesflow_workflow_engine::validator::validate_for_confirmation;

fn opt_field() -> impl Strategy<Value = Option<String>> {
    proptest::option::of("[a-z]{1,8}")
}

fn opt_type() -> impl Strategy<Value = Option<ShipmentType>> {
    prop_oneof![
        Just(None),
        Just(Some(ShipmentType::Fcl)),
        Just(Some(ShipmentType::Lcl)),
    ]
}

prop_compose! {
    fn shipment_details()(
        origin in opt_field(),
        destination in opt_field(),
        origin_country in opt_field(),
        destination_country in opt_field(),
        container_type in opt_field(),
        container_count in opt_field(),
        commodity in opt_field(),
        weight in opt_field(),
        volume in opt_field(),
        shipment_type in opt_type(),
        shipment_date in opt_field(),
        incoterm in opt_field(),
    ) -> ShipmentDetails {
        ShipmentDetails {
            origin,
            destination,
            origin_country,
            destination_country,
            container_type,
            container_count,
            commodity,
            weight,
            volume,
            shipment_type,
            shipment_date,
            incoterm,
        }
    }
}

prop_compose! {
    fn extraction()(
        shipment_details in shipment_details(),
        name in opt_field(),
        email in opt_field(),
        requested_dates in opt_field(),
        special_requirements in proptest::collection::vec("[a-z]{1,6}", 0..4),
        additional_notes in opt_field(),
    ) -> Extraction {
        Extraction {
            shipment_details,
            contact_information: ContactInformation {
                name,
                email,
                ..Default::default()
            },
            timeline_information: TimelineInformation {
                requested_dates,
                ..Default::default()
            },
            special_requirements,
            rate_information: Default::default(),
            additional_notes,
        }
    }
}

proptest! {
    /// Empty-is-no-update: merging an empty extraction changes nothing.
    #[test]
    fn merging_an_empty_extraction_is_identity(cumulative in extraction()) {
        let merged = merge_with_recency_priority(&Extraction::default(), &cumulative);
        prop_assert_eq!(merged, cumulative);
    }

    /// No-lose: without a shipment-type change, every cumulative field
    /// survives unless a non-empty new value overrides it.
    #[test]
    fn merge_never_loses_fields_without_type_change(
        mut new in extraction(),
        cumulative in extraction(),
    ) {
        new.shipment_details.shipment_type = None;
        let merged = merge_with_recency_priority(&new, &cumulative);

        let n = &new.shipment_details;
        let c = &cumulative.shipment_details;
        let m = &merged.shipment_details;
        prop_assert_eq!(m.origin.as_ref(), n.origin.as_ref().or(c.origin.as_ref()));
        prop_assert_eq!(m.destination.as_ref(), n.destination.as_ref().or(c.destination.as_ref()));
        prop_assert_eq!(m.container_type.as_ref(), n.container_type.as_ref().or(c.container_type.as_ref()));
        prop_assert_eq!(m.container_count.as_ref(), n.container_count.as_ref().or(c.container_count.as_ref()));
        prop_assert_eq!(m.commodity.as_ref(), n.commodity.as_ref().or(c.commodity.as_ref()));
        prop_assert_eq!(m.weight.as_ref(), n.weight.as_ref().or(c.weight.as_ref()));
        prop_assert_eq!(m.volume.as_ref(), n.volume.as_ref().or(c.volume.as_ref()));
        prop_assert_eq!(m.shipment_date.as_ref(), n.shipment_date.as_ref().or(c.shipment_date.as_ref()));
        prop_assert_eq!(m.shipment_type, c.shipment_type);

        // Special requirements are an ordered union.
        for requirement in &cumulative.special_requirements {
            prop_assert!(merged.special_requirements.contains(requirement));
        }
    }

    /// LCL pruning: a new LCL declaration removes the container fields,
    /// whatever either side carried.
    #[test]
    fn lcl_declaration_prunes_container_fields(
        mut new in extraction(),
        cumulative in extraction(),
    ) {
        new.shipment_details.shipment_type = Some(ShipmentType::Lcl);
        let merged = merge_with_recency_priority(&new, &cumulative);
        prop_assert_eq!(merged.shipment_details.container_type, None);
        prop_assert_eq!(merged.shipment_details.container_count, None);
        prop_assert_eq!(merged.shipment_details.shipment_type, Some(ShipmentType::Lcl));
    }

    /// Merging is idempotent: folding the same extraction in twice gives
    /// the same cumulative record.
    #[test]
    fn merge_is_idempotent(new in extraction(), cumulative in extraction()) {
        let once = merge_with_recency_priority(&new, &cumulative);
        let twice = merge_with_recency_priority(&new, &once);
        prop_assert_eq!(once, twice);
    }

    /// LCL never asks for containers, for any extraction that resolves
    /// to LCL.
    #[test]
    fn lcl_missing_list_never_mentions_containers(mut e in extraction()) {
        e.shipment_details.shipment_type = Some(ShipmentType::Lcl);
        let (_, missing) = validate_for_confirmation(&e, None);
        for field in &missing {
            let lowered = field.to_lowercase();
            prop_assert!(!lowered.contains("container_count"));
            prop_assert!(!lowered.contains("number of containers"));
            prop_assert!(!lowered.contains("quantity (number of containers)"));
            prop_assert!(!lowered.contains("container"));
        }
    }
}

/// Map a missing-field label onto its underlying field key.
fn field_key(label: &str) -> &'static str {
    let lowered = label.to_lowercase();
    if lowered.starts_with("origin") {
        "origin"
    } else if lowered.starts_with("destination") {
        "destination"
    } else if lowered.starts_with("shipment type") {
        "shipment_type"
    } else if lowered.starts_with("container type") {
        "container_type"
    } else if lowered.starts_with("quantity") {
        "container_count"
    } else if lowered.starts_with("weight") {
        "weight"
    } else if lowered.starts_with("volume") {
        "volume"
    } else if lowered.starts_with("shipment date") {
        "shipment_date"
    } else if lowered.starts_with("commodity") {
        "commodity"
    } else {
        "other"
    }
}

proptest! {
    /// Missing-fields monotonicity: for an extraction with an explicit
    /// shipment type, filling any absent data field never adds a new
    /// missing-field key.
    #[test]
    fn filling_fields_never_adds_missing_keys(
        mut e in extraction(),
        fcl in proptest::bool::ANY,
        field_index in 0usize..6,
    ) {
        e.shipment_details.shipment_type = Some(if fcl {
            ShipmentType::Fcl
        } else {
            ShipmentType::Lcl
        });
        let (_, before) = validate_for_confirmation(&e, None);

        let mut filled = e.clone();
        let s = &mut filled.shipment_details;
        let target = match field_index {
            0 => &mut s.origin,
            1 => &mut s.destination,
            2 => &mut s.container_type,
            3 => &mut s.commodity,
            4 => &mut s.weight,
            _ => &mut s.shipment_date,
        };
        if target.is_none() {
            *target = Some("filled".to_string());
        }
        let (_, after) = validate_for_confirmation(&filled, None);

        let before_keys: std::collections::BTreeSet<&str> =
            before.iter().map(|f| field_key(f)).collect();
        for field in &after {
            prop_assert!(
                before_keys.contains(field_key(field)),
                "filling a field added missing entry {:?} (before: {:?})",
                field,
                before
            );
        }
    }
}
