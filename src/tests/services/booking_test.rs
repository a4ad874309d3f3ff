use chrono::Weekday;
use pretty_assertions::assert_eq;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::client_mock::{setup_mock_backend, MockTurnosBackend};
use crate::errors::{ApiError, AuthError};
use crate::models::schedule::WeeklySchedule;
use crate::services::booking::{BookingService, ReservationOutcome};
use crate::services::holidays::HolidaySet;
use crate::services::time_slots::{OccupiedSet, SlotStatus};
use crate::tests::common::fixtures::{
    holiday, hora, monday, monday_morning, reserva, saturday, sunday, sunday_evening,
    user_session,
};

fn service() -> (BookingService, Arc<crate::client_mock::MockDataStore>) {
    let (mock, store) = setup_mock_backend();
    (
        BookingService::new(Arc::new(mock), HolidaySet::default()),
        store,
    )
}

fn times(availability: &crate::services::booking::Availability) -> Vec<String> {
    availability
        .slots
        .iter()
        .map(|s| s.hora.format("%H:%M").to_string())
        .collect()
}

#[tokio::test]
async fn test_availability_for_a_working_day() {
    let (service, _) = service();

    let availability = service
        .availability(1, monday(), sunday_evening())
        .await
        .unwrap();

    assert_eq!(availability.dia, "Lunes");
    assert_eq!(
        times(&availability),
        vec![
            "09:00", "09:30", "10:00", "10:30", "11:00", "11:30", "15:00", "15:30", "16:00",
            "16:30", "17:00", "17:30"
        ]
    );
    assert!(availability.slots.iter().all(|s| s.is_free()));
}

#[tokio::test]
async fn test_availability_weekend_and_holiday_rules() {
    let (service, _) = service();

    let sat = service
        .availability(1, saturday(), sunday_evening())
        .await
        .unwrap();
    assert_eq!(times(&sat), vec!["10:00", "10:30"]);

    let sun = service
        .availability(1, sunday(), sunday_evening())
        .await
        .unwrap();
    assert!(sun.slots.is_empty());

    let feriado = service
        .availability(1, holiday(), sunday_evening())
        .await
        .unwrap();
    assert!(feriado.slots.is_empty());
}

#[tokio::test]
async fn test_availability_today_hides_past_times() {
    let (service, _) = service();

    let availability = service
        .availability(1, monday(), monday_morning())
        .await
        .unwrap();

    assert_eq!(times(&availability)[0], "09:30");
    assert_eq!(availability.slots.len(), 11);
}

#[tokio::test]
async fn test_availability_tags_occupied_slots() {
    let (service, store) = service();
    store.book(reserva(1, monday(), "10:00"), 55).unwrap();

    let availability = service
        .availability(1, monday(), sunday_evening())
        .await
        .unwrap();

    let ten = availability
        .slots
        .iter()
        .find(|s| s.hora == hora("10:00"))
        .unwrap();
    assert_eq!(ten.estado, SlotStatus::Occupied);
    assert_eq!(availability.slots.iter().filter(|s| !s.is_free()).count(), 1);
}

#[tokio::test]
async fn test_past_date_is_rejected_without_fetching() {
    // No expectations: any backend call would panic
    let service = BookingService::new(Arc::new(MockTurnosBackend::new()), HolidaySet::default());

    let result = service
        .availability(1, monday(), saturday().and_hms_opt(8, 0, 0).unwrap())
        .await;
    assert!(matches!(result, Err(ApiError::Validation(_))));

    let result = service
        .select_slot(
            &user_session(),
            &reserva(1, monday(), "10:00"),
            saturday().and_hms_opt(8, 0, 0).unwrap(),
        )
        .await;
    assert!(matches!(result, Err(ApiError::Validation(_))));
}

#[tokio::test]
async fn test_malformed_schedule_is_a_validation_error() {
    let (service, store) = service();
    store.set_schedule(WeeklySchedule::new().with_day(Weekday::Mon, &["mañana"]));

    let result = service.availability(1, monday(), sunday_evening()).await;
    match result {
        Err(ApiError::Validation(message)) => assert!(message.contains("mañana")),
        other => panic!("unexpected result: {:?}", other),
    }
}

#[tokio::test]
async fn test_select_free_slot_reserves_and_refreshes() {
    let (service, store) = service();

    let outcome = service
        .select_slot(&user_session(), &reserva(1, monday(), "09:30"), sunday_evening())
        .await
        .unwrap();

    match outcome {
        ReservationOutcome::Reserved { availability } => {
            let slot = availability
                .slots
                .iter()
                .find(|s| s.hora == hora("09:30"))
                .unwrap();
            assert_eq!(slot.estado, SlotStatus::Occupied);
        }
        other => panic!("unexpected outcome: {:?}", other),
    }

    assert_eq!(store.bookings_of(7).len(), 1);
}

#[tokio::test]
async fn test_select_occupied_slot_is_a_no_op() {
    let (service, store) = service();
    store.book(reserva(1, monday(), "09:30"), 55).unwrap();

    let outcome = service
        .select_slot(&user_session(), &reserva(1, monday(), "09:30"), sunday_evening())
        .await
        .unwrap();

    assert!(matches!(outcome, ReservationOutcome::Occupied { .. }));
    assert!(store.bookings_of(7).is_empty());
}

#[tokio::test]
async fn test_select_time_outside_grid() {
    let (service, _) = service();

    // 12:00 closes the morning range
    let result = service
        .select_slot(&user_session(), &reserva(1, monday(), "12:00"), sunday_evening())
        .await;
    assert!(matches!(result, Err(ApiError::Validation(_))));

    let result = service
        .select_slot(&user_session(), &reserva(1, sunday(), "10:00"), sunday_evening())
        .await;
    assert!(matches!(result, Err(ApiError::Validation(_))));
}

#[tokio::test]
async fn test_lost_race_refreshes_availability() {
    let mut mock = MockTurnosBackend::new();
    let fetches = Arc::new(AtomicUsize::new(0));

    mock.expect_weekly_schedule().returning(|_| {
        Ok(WeeklySchedule::new().with_day(Weekday::Mon, &["09:00-10:00"]))
    });

    let counter = Arc::clone(&fetches);
    mock.expect_occupied().returning(move |_, _| {
        // Someone books 09:00 right after the first look
        if counter.fetch_add(1, Ordering::SeqCst) == 0 {
            Ok(OccupiedSet::default())
        } else {
            Ok([hora("09:00")].into_iter().collect())
        }
    });

    mock.expect_reserve()
        .times(1)
        .returning(|_, _| Err(ApiError::Conflict("Turno ya reservado".to_string())));

    let service = BookingService::new(Arc::new(mock), HolidaySet::default());
    let outcome = service
        .select_slot(&user_session(), &reserva(1, monday(), "09:00"), sunday_evening())
        .await
        .unwrap();

    match outcome {
        ReservationOutcome::Conflict {
            message,
            availability,
        } => {
            assert_eq!(message, "Turno ya reservado");
            assert_eq!(availability.slots[0].estado, SlotStatus::Occupied);
            assert_eq!(availability.slots[1].estado, SlotStatus::Free);
        }
        other => panic!("unexpected outcome: {:?}", other),
    }
    assert_eq!(fetches.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_reserved_even_when_refresh_fails() {
    let mut mock = MockTurnosBackend::new();
    let fetches = Arc::new(AtomicUsize::new(0));

    mock.expect_weekly_schedule().returning(|_| {
        Ok(WeeklySchedule::new().with_day(Weekday::Mon, &["09:00-10:00"]))
    });

    let counter = Arc::clone(&fetches);
    mock.expect_occupied().returning(move |_, _| {
        if counter.fetch_add(1, Ordering::SeqCst) == 0 {
            Ok(OccupiedSet::default())
        } else {
            Err(ApiError::Server {
                status: 503,
                message: "down".to_string(),
            })
        }
    });
    mock.expect_reserve().times(1).returning(|_, _| Ok(()));

    let service = BookingService::new(Arc::new(mock), HolidaySet::default());
    let outcome = service
        .select_slot(&user_session(), &reserva(1, monday(), "09:30"), sunday_evening())
        .await
        .unwrap();

    match outcome {
        ReservationOutcome::Reserved { availability } => {
            assert_eq!(availability.slots[0].estado, SlotStatus::Free);
            assert_eq!(availability.slots[1].hora, hora("09:30"));
            assert_eq!(availability.slots[1].estado, SlotStatus::Occupied);
        }
        other => panic!("unexpected outcome: {:?}", other),
    }
    assert_eq!(fetches.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_other_reservation_errors_propagate() {
    let mut mock = MockTurnosBackend::new();
    mock.expect_weekly_schedule().returning(|_| {
        Ok(WeeklySchedule::new().with_day(Weekday::Mon, &["09:00-10:00"]))
    });
    mock.expect_occupied()
        .times(1)
        .returning(|_, _| Ok(OccupiedSet::default()));
    mock.expect_reserve()
        .returning(|_, _| Err(ApiError::Auth(AuthError::Rejected("Token vencido".to_string()))));

    let service = BookingService::new(Arc::new(mock), HolidaySet::default());
    let result = service
        .select_slot(&user_session(), &reserva(1, monday(), "09:00"), sunday_evening())
        .await;

    assert!(matches!(
        result,
        Err(ApiError::Auth(AuthError::Rejected(_)))
    ));
}

#[tokio::test]
async fn test_my_bookings_and_cancel() {
    let (service, store) = service();
    let id = store.book(reserva(1, monday(), "11:00"), 7).unwrap();

    let turnos = service.my_bookings(&user_session()).await.unwrap();
    assert_eq!(turnos.len(), 1);
    assert_eq!(turnos[0].empresa_nombre.as_deref(), Some("Barbería Centro"));

    service.cancel(&user_session(), id).await.unwrap();
    assert!(service.my_bookings(&user_session()).await.unwrap().is_empty());

    assert!(matches!(
        service.cancel(&user_session(), id).await,
        Err(ApiError::NotFound(_))
    ));
}
