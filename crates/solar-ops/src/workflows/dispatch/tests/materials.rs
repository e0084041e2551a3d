use super::common::{crew, engine, job, order, target_date};
use crate::workflows::dispatch::domain::{MaterialOrder, MaterialOrderStatus, PerformanceStatus};
use crate::workflows::dispatch::engine::{
    BlockingReason, DispatchRecommendation, MaterialsEtaStatus,
};

fn recommend_with(orders: Vec<MaterialOrder>) -> DispatchRecommendation {
    let mut job = job("job-1");
    job.material_orders = orders;
    engine().compute_recommendation_for_job(
        &job,
        &[crew("sub-1", Some(PerformanceStatus::Green), Some(3), None)],
        target_date(),
    )
}

#[test]
fn no_orders_is_unknown_and_does_not_block() {
    let recommendation = recommend_with(Vec::new());

    assert_eq!(recommendation.materials_eta, MaterialsEtaStatus::Unknown);
    assert!(recommendation.can_start);
}

#[test]
fn delivered_orders_are_on_track() {
    let recommendation = recommend_with(vec![order(MaterialOrderStatus::Delivered, Some(-72))]);

    assert_eq!(recommendation.materials_eta, MaterialsEtaStatus::OnTrack);
    assert!(recommendation.blocking_reasons.is_empty());
}

#[test]
fn overdue_order_is_late_and_blocks() {
    let recommendation = recommend_with(vec![order(MaterialOrderStatus::Ordered, Some(-5 * 24))]);

    assert_eq!(recommendation.materials_eta, MaterialsEtaStatus::Late);
    assert_eq!(
        recommendation.blocking_reasons,
        vec![BlockingReason::MaterialsNotReady]
    );
    assert!(!recommendation.can_start);
    assert!(recommendation.recommended_subcontractor.is_some());
}

#[test]
fn late_wins_over_at_risk_regardless_of_order() {
    let recommendation = recommend_with(vec![
        order(MaterialOrderStatus::Pending, None),
        order(MaterialOrderStatus::Shipped, Some(-1)),
    ]);

    assert_eq!(recommendation.materials_eta, MaterialsEtaStatus::Late);
}

#[test]
fn missing_eta_is_at_risk() {
    let recommendation = recommend_with(vec![order(MaterialOrderStatus::Backordered, None)]);

    assert_eq!(recommendation.materials_eta, MaterialsEtaStatus::AtRisk);
    assert!(recommendation.can_start);
}

#[test]
fn eta_inside_three_day_window_is_at_risk() {
    let boundary = recommend_with(vec![order(MaterialOrderStatus::Shipped, Some(72))]);
    let outside = recommend_with(vec![order(MaterialOrderStatus::Shipped, Some(73))]);

    assert_eq!(boundary.materials_eta, MaterialsEtaStatus::AtRisk);
    assert_eq!(outside.materials_eta, MaterialsEtaStatus::OnTrack);
}

#[test]
fn delivered_orders_are_ignored_alongside_open_ones() {
    let recommendation = recommend_with(vec![
        order(MaterialOrderStatus::Delivered, Some(-240)),
        order(MaterialOrderStatus::Ordered, Some(24 * 10)),
    ]);

    assert_eq!(recommendation.materials_eta, MaterialsEtaStatus::OnTrack);
}
