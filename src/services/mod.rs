/// Per-session tick that admits pending players.
pub mod broadcast_loop;
/// OpenAPI documentation generation.
pub mod documentation;
/// Health check service.
pub mod health_service;
/// Random session code generation.
pub mod session_code;
/// Session creation, lookup and host operations.
pub mod session_service;
/// WebSocket connection and message handling service.
pub mod websocket_service;
