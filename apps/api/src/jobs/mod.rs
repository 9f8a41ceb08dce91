// Posting browsing and per-user interactions (save / hide / apply).
pub mod handlers;
