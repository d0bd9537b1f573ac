use axum::{
    Form, Router,
    extract::State,
    response::Html,
    routing::get,
};
use axum_helpers::AppError;
use std::sync::Arc;

use super::{Action, Begin, Console, ConsoleForm, ConsoleRenderer, FormAction, Outcome, Phase, Results};
use crate::service::DocumentService;
use crate::store::VectorStoreClient;

struct ConsoleState<S: VectorStoreClient> {
    service: Arc<DocumentService<S>>,
    renderer: ConsoleRenderer,
}

impl<S: VectorStoreClient> Clone for ConsoleState<S> {
    fn clone(&self) -> Self {
        Self {
            service: self.service.clone(),
            renderer: self.renderer.clone(),
        }
    }
}

/// Create the console router, serving the page at `/`
pub fn router<S: VectorStoreClient + 'static>(
    service: Arc<DocumentService<S>>,
    renderer: ConsoleRenderer,
) -> Router {
    Router::new()
        .route("/", get(show::<S>).post(submit::<S>))
        .with_state(ConsoleState { service, renderer })
}

async fn show<S: VectorStoreClient>(
    State(state): State<ConsoleState<S>>,
) -> Result<Html<String>, AppError> {
    render(&state.renderer, &Console::new())
}

/// Apply the pressed button to the submitted console and render the result.
/// Store failures end up in the banner, never as an error page.
async fn submit<S: VectorStoreClient>(
    State(state): State<ConsoleState<S>>,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Result<Html<String>, AppError> {
    let (mut console, action) = ConsoleForm::from_pairs(pairs).into_console();

    if let Some(action) = action {
        apply(&state.service, &mut console, action).await;
    }

    render(&state.renderer, &console)
}

async fn apply<S: VectorStoreClient>(
    service: &DocumentService<S>,
    console: &mut Console,
    action: FormAction,
) {
    let begun = match action {
        FormAction::AddRow => return console.add_row(),
        FormAction::RemoveRow(index) => return console.remove_row(index),
        FormAction::ResetRows => return console.reset_rows(),
        FormAction::CancelClear => {
            if let Err(err) = console.cancel_clear() {
                tracing::debug!(error = %err, "Ignoring cancel");
            }
            return;
        }
        FormAction::Add => console.begin(Action::Add),
        FormAction::Query => console.begin(Action::Query),
        FormAction::Clear => console.begin(Action::Clear),
        FormAction::ConfirmClear => console.confirm_clear(),
    };

    match begun {
        Ok(Begin::Proceed) => {
            if let Phase::Submitting(action) = console.phase() {
                let outcome = run(service, console, action).await;
                console.finish(outcome);
            }
        }
        Ok(Begin::AwaitConfirmation) => {}
        Err(err) => tracing::debug!(error = %err, ?action, "Console action refused"),
    }
}

async fn run<S: VectorStoreClient>(
    service: &DocumentService<S>,
    console: &Console,
    action: Action,
) -> Outcome {
    let result = match action {
        Action::Add => service.ingest(console.rows()).await.map(Outcome::Added),
        Action::Query => service
            .query(Some(console.query()), None)
            .await
            .map(|outcome| {
                Outcome::Queried(Results {
                    query: outcome.query,
                    metric: outcome.metric,
                    result: outcome.results,
                })
            }),
        Action::Clear => service.clear().await.map(|()| Outcome::Cleared),
    };

    result.unwrap_or_else(Outcome::Failed)
}

fn render(renderer: &ConsoleRenderer, console: &Console) -> Result<Html<String>, AppError> {
    renderer
        .render(console)
        .map(Html)
        .map_err(|err| {
            tracing::error!(error = %err, "Failed to render console");
            AppError::InternalServerError(err.to_string())
        })
}
