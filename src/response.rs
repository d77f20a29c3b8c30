//! Sobre uniforme `{message, data}` para las respuestas correctas.

use axum::{
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Mensaje estable asociado a cada operación.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseMessage {
    CompanyFound,
    LeadsListed,
    ChatsListed,
}

impl ResponseMessage {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::CompanyFound => "회사 정보 조회 성공",
            Self::LeadsListed => "리드 추천 목록 조회 성공",
            Self::ChatsListed => "채팅 내역 조회 성공",
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub message: &'static str,
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn new(message: ResponseMessage, data: T) -> Self {
        Self {
            message: message.as_str(),
            data,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}
