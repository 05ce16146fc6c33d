//! Named facades for the learning platform's endpoints

use super::client::ApiClient;
use super::facade::{ResourceFacade, ScopeFacade};

/// Entry point to every resource the platform exposes.
///
/// ```no_run
/// # async fn demo(client: lingua_infra::api::ApiClient) -> Result<(), lingua_infra::api::ApiError> {
/// use lingua_infra::api::{Query, ReadOptions};
///
/// let catalog = client.catalog();
/// let lessons = catalog
///     .lessons()
///     .list::<serde_json::Value>(&Query::new().with("topic", 3), ReadOptions::default())
///     .await?;
/// # let _ = lessons;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Catalog {
    client: ApiClient,
}

impl Catalog {
    /// Catalog over `client`
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// Current user's state (profile, streak, daily goal).
    pub fn me(&self) -> ScopeFacade {
        self.client.scope("/me/")
    }

    /// Practice sessions: start, answer, finish.
    pub fn sessions(&self) -> ScopeFacade {
        self.client.scope("/sessions/")
    }

    /// Search endpoints under `/search/`
    pub fn search(&self) -> ScopeFacade {
        self.client.scope("/search/")
    }
}

macro_rules! resources {
    ($($name:ident => $path:literal),+ $(,)?) => {
        impl Catalog {
            $(
                #[doc = concat!("Facade for `", $path, "`.")]
                pub fn $name(&self) -> ResourceFacade {
                    self.client.resource($path)
                }
            )+
        }

        /// `(name, base path)` of every catalogued resource.
        pub const RESOURCES: &[(&str, &str)] = &[$((stringify!($name), $path)),+];
    };
}

resources! {
    languages => "/languages/",
    topics => "/topics/",
    lessons => "/lessons/",
    skills => "/skills/",
    question_types => "/question-types/",
    questions => "/questions/",
    answers => "/answers/",
    words => "/words/",
    sentences => "/sentences/",
    courses => "/courses/",
    enrollments => "/enrollments/",
    progress => "/progress/",
    achievements => "/achievements/",
    streaks => "/streaks/",
    notifications => "/notifications/",
    users => "/users/",
    profiles => "/profiles/",
    leaderboards => "/leaderboards/",
    reviews => "/reviews/",
    audio_clips => "/audio-clips/",
}
