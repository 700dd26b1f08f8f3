use scoreboard_entities::mock::{self, MockOption};
use tracing::info;

use crate::state::AppState;

#[derive(clap::Subcommand)]
pub enum Command {
    /// Run the HTTP API.
    Serve,
    /// Insert a demo sub-event with a sample roster and entries.
    SeedDemo {
        #[arg(long, default_value_t = 20)]
        participants: usize,
    },
}

impl Command {
    pub async fn run(&self, app_state: AppState) -> anyhow::Result<()> {
        match self {
            Command::Serve => {
                let config = app_state.config.clone();
                let app = crate::app_with_state(app_state).await;
                let addr = format!("{}:{}", config.host, config.port).parse()?;
                info!("Listening on {}", addr);
                axum::Server::bind(&addr)
                    .serve(app.into_make_service())
                    .await?;
            },
            Command::SeedDemo { participants } => {
                let competition = mock::make_mock_competition_with_options(MockOption {
                    num_participants: *participants,
                    ..Default::default()
                });
                competition.save_all(&app_state.db).await?;
                info!(
                    sub_event = %competition.sub_event.id,
                    participants = competition.roster.len(),
                    entries = competition.entries.len(),
                    "Seeded demo sub-event"
                );
            }
        }
        Ok(())
    }
}
