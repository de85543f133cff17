use std::convert::Infallible;

use axum::{
    extract::{rejection::JsonRejection, State},
    response::sse::{Event, KeepAlive, Sse},
    routing::{get, post},
    Json, Router,
};
use futures::Stream;
use serde::Deserialize;
use tokio::sync::broadcast::error::RecvError;
use tracing::{instrument, warn};

use super::counter::CounterSnapshot;
use crate::{auth::Credential, error::SyncError, session::CounterEvent, state::AppState};

pub fn water_routes() -> Router<AppState> {
    Router::new()
        .route("/water", get(get_water))
        .route("/water/increment", post(increment))
        .route("/water/decrement", post(decrement))
        .route("/water/reset", post(reset))
        .route("/water/events", get(events))
}

#[derive(Debug, Deserialize)]
pub struct AmountRequest {
    #[serde(default = "one")]
    pub amount: u32,
}

fn one() -> u32 {
    1
}

/// A request without a JSON body counts as one glass; a JSON body that does
/// not hold a non-negative integer amount is rejected.
fn amount(body: Result<Json<AmountRequest>, JsonRejection>) -> Result<u32, SyncError> {
    match body {
        Ok(Json(b)) => Ok(b.amount),
        Err(JsonRejection::MissingJsonContentType(_)) => Ok(1),
        Err(rejection) => {
            warn!(error = %rejection, "invalid water amount");
            Err(SyncError::Validation(format!(
                "amount must be a non-negative integer: {}",
                rejection.body_text()
            )))
        }
    }
}

#[instrument(skip(state, credential), fields(subject = %credential.subject()))]
pub async fn get_water(State(state): State<AppState>, credential: Credential) -> Json<CounterSnapshot> {
    let today = state.clock.today();
    let session = state.sessions.for_subject(credential.subject(), today);
    let snapshot = session.water().snapshot(today);
    Json(snapshot)
}

#[instrument(skip(state, credential, body), fields(subject = %credential.subject()))]
pub async fn increment(
    State(state): State<AppState>,
    credential: Credential,
    body: Result<Json<AmountRequest>, JsonRejection>,
) -> Result<Json<CounterSnapshot>, SyncError> {
    let delta = amount(body)?;
    Ok(update(&state, &credential, |counter, today| {
        counter.increment(delta, today);
    }))
}

#[instrument(skip(state, credential, body), fields(subject = %credential.subject()))]
pub async fn decrement(
    State(state): State<AppState>,
    credential: Credential,
    body: Result<Json<AmountRequest>, JsonRejection>,
) -> Result<Json<CounterSnapshot>, SyncError> {
    let delta = amount(body)?;
    Ok(update(&state, &credential, |counter, today| {
        counter.decrement(delta, today);
    }))
}

#[instrument(skip(state, credential), fields(subject = %credential.subject()))]
pub async fn reset(State(state): State<AppState>, credential: Credential) -> Json<CounterSnapshot> {
    let today = state.clock.today();
    let session = state.sessions.for_subject(credential.subject(), today);
    let snapshot = {
        let mut counter = session.water();
        counter.reset(today);
        counter.snapshot(today)
    };
    let _ = state.events.send(CounterEvent::Reset {
        subject: credential.subject().to_owned(),
        date: today,
    });
    Json(snapshot)
}

fn update(
    state: &AppState,
    credential: &Credential,
    apply: impl FnOnce(&mut super::DailyCounter, time::Date),
) -> Json<CounterSnapshot> {
    let today = state.clock.today();
    let session = state.sessions.for_subject(credential.subject(), today);
    let snapshot = {
        let mut counter = session.water();
        apply(&mut *counter, today);
        counter.snapshot(today)
    };
    let _ = state.events.send(CounterEvent::Updated {
        subject: credential.subject().to_owned(),
        value: snapshot.value,
        cap: snapshot.cap,
    });
    Json(snapshot)
}

/// Server-sent counter events for the calling user.
pub async fn events(
    State(state): State<AppState>,
    credential: Credential,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let mut rx = state.events.subscribe();
    let subject = credential.subject().to_owned();

    let stream = async_stream::stream! {
        loop {
            match rx.recv().await {
                Ok(event) if event.concerns(&subject) => {
                    match Event::default().event(event.name()).json_data(&event) {
                        Ok(sse) => yield Ok(sse),
                        Err(e) => warn!(error = %e, "failed to encode counter event"),
                    }
                }
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => {
                    warn!(%subject, skipped, "counter event stream lagged");
                }
                Err(RecvError::Closed) => break,
            }
        }
    };

    Sse::new(stream).keep_alive(KeepAlive::default())
}
