use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for Live Quiz Back.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::game::game_state,
        crate::routes::game::quiz_overview,
        crate::routes::sse::public_stream,
        crate::routes::websocket::player_ws,
        crate::routes::websocket::admin_ws,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::ws::ClientMessage,
            crate::dto::ws::ServerMessage,
            crate::dto::ws::ShowQuestionRequest,
            crate::dto::game::GameStateSnapshot,
            crate::dto::game::QuizOverview,
            crate::dto::game::QuestionDto,
            crate::dto::game::PlayerQuestion,
            crate::dto::game::QuestionResults,
            crate::dto::game::FinalStandings,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "game", description = "Live session state and stored quizzes"),
        (name = "sse", description = "Server-sent events streams"),
        (name = "websocket", description = "Player and admin WebSocket endpoints"),
    )
)]
pub struct ApiDoc;
