use serde::Serialize;

#[derive(Serialize)]
pub struct OkResponse {
    pub ok: bool,
}

pub const OK: OkResponse = OkResponse { ok: true };

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}
