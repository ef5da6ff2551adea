//! End-to-end scenarios with the reference collaborators

use salesflow_integration_tests::{customer_email, engine_at};
use salesflow_workflow_engine::thread_store::Direction;
use salesflow_workflow_engine::{RawEmail, TurnStatus};
use tempfile::TempDir;

const COMPLETE_FCL_BODY: &str = "Hello,\n\nWe need to ship from Shanghai to Los Angeles.\nContainer: 2 x 40HC\nCommodity: Electronics\nWeight: 20,000 kg\nReady date: 2024-03-15\nIncoterm: FOB\n\nThis is an FCL shipment.\n\nThanks,\nJohn";

#[tokio::test]
async fn happy_path_complete_fcl_requests_confirmation() {
    let dir = TempDir::new().unwrap();
    let engine = engine_at(dir.path());

    let outcome = engine
        .process_email(customer_email("thread_s1", "Shipping inquiry", COMPLETE_FCL_BODY))
        .await;

    assert_eq!(outcome.status, TurnStatus::Completed);
    assert_eq!(
        outcome.state.next_action.as_ready().unwrap().action,
        "send_confirmation_request"
    );

    let payload = outcome.state.confirmation_response.as_ready().unwrap();
    assert!(payload.subject.contains("CNSHA"), "{}", payload.subject);
    assert!(payload.subject.contains("USLAX"), "{}", payload.subject);

    // A single outbound entry; no forwarder assignment yet.
    let thread = engine.store().load("thread_s1").unwrap();
    let outbound: Vec<_> = thread
        .email_chain
        .iter()
        .filter(|e| e.direction == Direction::Outbound)
        .collect();
    assert_eq!(outbound.len(), 1);
    assert_eq!(outbound[0].response_type.as_deref(), Some("confirmation"));
    assert!(outcome.state.forwarder_assignment.is_unset());
}

#[tokio::test]
async fn minimal_request_enumerates_missing_fields_in_priority_order() {
    let dir = TempDir::new().unwrap();
    let engine = engine_at(dir.path());

    let outcome = engine
        .process_email(customer_email(
            "thread_s2",
            "Quote request",
            "I want to ship from USA to China. Please send me a quote.",
        ))
        .await;

    assert_eq!(outcome.status, TurnStatus::Completed);
    let payload = outcome.state.clarification_response.as_ready().unwrap();
    assert_eq!(
        payload.missing_fields,
        vec![
            "Destination (specific port required)".to_string(),
            "Origin (specific port required)".to_string(),
            "Container Type".to_string(),
            "Shipment Date".to_string(),
            "Commodity Name".to_string(),
            "Volume".to_string(),
            "Weight".to_string(),
            "Shipment Type (FCL or LCL)".to_string(),
        ]
    );

    // The body enumerates the same items in the same order.
    let mut last = 0;
    for field in &payload.missing_fields {
        let needle = format!("- {}", field);
        let position = payload.body[last..]
            .find(&needle)
            .unwrap_or_else(|| panic!("{} not found after {}", needle, last));
        last += position;
    }

    let thread = engine.store().load("thread_s2").unwrap();
    let outbound: Vec<_> = thread
        .email_chain
        .iter()
        .filter(|e| e.direction == Direction::Outbound)
        .collect();
    assert_eq!(outbound.len(), 1);
    assert_eq!(outbound[0].response_type.as_deref(), Some("clarification"));
}

#[tokio::test]
async fn confirmation_with_complete_data_triggers_forwarder_assignment() {
    let dir = TempDir::new().unwrap();
    let engine = engine_at(dir.path());

    let first = engine
        .process_email(customer_email("thread_s3", "Shipping inquiry", COMPLETE_FCL_BODY))
        .await;
    assert!(first.state.confirmation_response.is_ready());

    let second = engine
        .process_email(customer_email(
            "thread_s3",
            "Re: Please Confirm Your Shipment Details",
            "I confirm the details. Please proceed.",
        ))
        .await;

    assert_eq!(second.status, TurnStatus::Completed);
    assert!(second.state.workflow_completed);
    assert!(second.state.confirmation_acknowledgment.is_ready());

    let assignment = second.state.forwarder_assignment.as_ready().unwrap();
    assert_eq!(assignment.status, "success");
    let forwarder = assignment.assigned_forwarder.as_ref().unwrap();
    // Destination-country match beats origin-country match.
    assert_eq!(forwarder.country, "USA");
    assert!(assignment.rate_request.is_some());

    let thread = engine.store().load("thread_s3").unwrap();
    let outbound: Vec<_> = thread
        .email_chain
        .iter()
        .filter(|e| e.direction == Direction::Outbound)
        .collect();
    assert_eq!(outbound.len(), 2);
    assert_eq!(
        outbound[1].response_type.as_deref(),
        Some("confirmation_acknowledgment")
    );
}

#[tokio::test]
async fn confirmation_with_missing_date_falls_back_to_clarification() {
    let dir = TempDir::new().unwrap();
    let engine = engine_at(dir.path());

    // Same shipment but the ready date was never stated.
    let body = "Hello,\n\nWe need to ship from Shanghai to Los Angeles.\nContainer: 2 x 40HC\nCommodity: Electronics\nWeight: 20,000 kg\nIncoterm: FOB\n\nThis is an FCL shipment.\n\nThanks,\nJohn";
    engine
        .process_email(customer_email("thread_s4", "Shipping inquiry", body))
        .await;

    let second = engine
        .process_email(customer_email(
            "thread_s4",
            "Re: quote",
            "I confirm the details. Please proceed.",
        ))
        .await;

    assert_eq!(second.status, TurnStatus::Completed);
    let payload = second.state.clarification_response.as_ready().unwrap();
    assert_eq!(payload.missing_fields, vec!["Shipment Date".to_string()]);
    assert!(!second.state.confirmation_acknowledgment.is_ready());
    assert!(second.state.forwarder_assignment.is_unset());

    let thread = engine.store().load("thread_s4").unwrap();
    let last = thread.email_chain.last().unwrap();
    assert_eq!(last.direction, Direction::Outbound);
    assert_eq!(last.response_type.as_deref(), Some("clarification"));
}

#[tokio::test]
async fn lcl_shipment_never_involves_containers() {
    let dir = TempDir::new().unwrap();
    let engine = engine_at(dir.path());

    let body = "Hi,\n\nWe have an LCL shipment from Shanghai to Los Angeles.\nWeight: 1,200 kg\nVolume: 8 cbm\nCommodity: Textiles\nReady date: 2024-03-20\n\nRegards,\nAnna";
    let outcome = engine
        .process_email(customer_email("thread_s5", "LCL inquiry", body))
        .await;

    assert_eq!(outcome.status, TurnStatus::Completed);

    // The merged extraction carries no container fields.
    let cumulative = engine.store().cumulative("thread_s5");
    assert_eq!(cumulative.shipment_details.container_type, None);
    assert_eq!(cumulative.shipment_details.container_count, None);
    assert_eq!(cumulative.shipment_details.weight.as_deref(), Some("1,200 kg"));
    assert_eq!(cumulative.shipment_details.volume.as_deref(), Some("8 cbm"));

    // Date and commodity are present, so the confirmation is reachable.
    let payload = outcome.state.confirmation_response.as_ready().unwrap();
    assert_eq!(payload.response_type, "confirmation");
    assert!(!payload.body.to_lowercase().contains("container"));
}

#[tokio::test]
async fn forwarder_rate_reply_flows_into_a_customer_quote() {
    let dir = TempDir::new().unwrap();
    let engine = engine_at(dir.path());

    // Seed the thread up to forwarder assignment.
    engine
        .process_email(customer_email("thread_s6", "Shipping inquiry", COMPLETE_FCL_BODY))
        .await;
    engine
        .process_email(customer_email(
            "thread_s6",
            "Re: confirm",
            "I confirm the details. Please proceed.",
        ))
        .await;

    let reply = RawEmail {
        sender: "rates@pacificbridge.example".to_string(),
        sender_name: None,
        subject: "Rates for Shanghai - Los Angeles".to_string(),
        content: "Hello,\n\nOur rate: USD 2,450 per 40HC, with OTHC $2,650.\nTransit time: 14 days. Valid until 2024-04-01.\n\nBest,\nPacific Bridge".to_string(),
        thread_id: Some("thread_s6".to_string()),
    };
    let outcome = engine.process_email(reply).await;
    assert_eq!(outcome.status, TurnStatus::Completed);

    // Acknowledgment, forwarder processing, sales notification, quote.
    assert!(outcome.state.acknowledgment_response.is_ready());
    let forwarder_reply = outcome.state.forwarder_response.as_ready().unwrap();
    assert!(forwarder_reply.rate_info.has_rates());
    let notification = outcome.state.sales_notification.as_ready().unwrap();
    assert_eq!(notification.notification_type, "rates_received");

    let quote = outcome.state.customer_quote.as_ready().unwrap();
    assert!(quote.subject.contains("Shanghai"), "{}", quote.subject);
    assert!(quote.subject.contains("Los Angeles"), "{}", quote.subject);
    assert!(quote.body.contains("2,450"));

    // The committed outbound for this turn is the acknowledgment.
    let thread = engine.store().load("thread_s6").unwrap();
    let last = thread.email_chain.last().unwrap();
    assert_eq!(last.direction, Direction::Outbound);
    assert_eq!(last.response_type.as_deref(), Some("acknowledgment"));

    // At most one outbound entry per committed turn, thread-wide.
    let outbound = thread
        .email_chain
        .iter()
        .filter(|e| e.direction == Direction::Outbound)
        .count();
    let inbound = thread.email_chain.len() - outbound;
    assert_eq!(inbound, 3);
    assert_eq!(outbound, 3);
}

#[tokio::test]
async fn cumulative_extraction_accumulates_across_turns() {
    let dir = TempDir::new().unwrap();
    let engine = engine_at(dir.path());

    engine
        .process_email(customer_email(
            "thread_grow",
            "Quote request",
            "We want to ship from Shanghai to Los Angeles. FCL.",
        ))
        .await;
    let cumulative = engine.store().cumulative("thread_grow");
    assert_eq!(cumulative.shipment_details.origin.as_deref(), Some("Shanghai"));
    assert_eq!(cumulative.shipment_details.commodity, None);

    engine
        .process_email(customer_email(
            "thread_grow",
            "Re: details",
            "Container: 2 x 40HC\nCommodity: Electronics\nWeight: 20,000 kg\nReady date: 2024-03-15\n",
        ))
        .await;
    let cumulative = engine.store().cumulative("thread_grow");
    // Earlier knowledge survives; new facts are folded in.
    assert_eq!(cumulative.shipment_details.origin.as_deref(), Some("Shanghai"));
    assert_eq!(
        cumulative.shipment_details.destination.as_deref(),
        Some("Los Angeles")
    );
    assert_eq!(
        cumulative.shipment_details.commodity.as_deref(),
        Some("Electronics")
    );
    assert_eq!(
        cumulative.shipment_details.container_type.as_deref(),
        Some("40HC")
    );
}

#[tokio::test]
async fn sales_person_signature_is_stable_within_a_thread() {
    let dir = TempDir::new().unwrap();
    let engine = engine_at(dir.path());

    let first = engine
        .process_email(customer_email("thread_sig", "Inquiry", "Quote from USA to China please."))
        .await;
    let second = engine
        .process_email(customer_email("thread_sig", "Re: Inquiry", "Adding details later."))
        .await;

    let a = first.state.assigned_sales_person.unwrap();
    let b = second.state.assigned_sales_person.unwrap();
    assert_eq!(a.id, b.id);
}
