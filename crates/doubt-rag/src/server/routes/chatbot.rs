//! Chatbot endpoints: questions, uploads, extraction and history

use axum::{
    extract::{
        multipart::MultipartRejection,
        rejection::JsonRejection,
        Multipart, State,
    },
    Json,
};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::generation::PromptBuilder;
use crate::ingestion::image_mime;
use crate::providers::ImageInput;
use crate::server::state::AppState;
use crate::types::{
    AnswerData, ApiResponse, AskRequest, BotMode, Document, ExtractData, HistoryEntry,
};

/// Question used for a math image uploaded without one
const DEFAULT_IMAGE_REQUEST: &str = "Solve the math problem shown in this image";

/// POST /api/chatbot/askdoubt - Answer a question in the requested mode
pub async fn ask_doubt(
    State(state): State<AppState>,
    payload: std::result::Result<Json<AskRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<AnswerData>>> {
    let Json(request) = payload?;
    let question = request
        .question()
        .ok_or_else(|| Error::invalid_input("No question provided"))?;
    let mode = request.mode();

    tracing::info!("Question ({}): \"{}\"", mode.as_str(), question);

    let answer = if request.use_context {
        let retrieval = &state.config().retrieval;
        let k = request
            .top_k
            .unwrap_or(retrieval.top_k)
            .clamp(1, retrieval.max_top_k.max(1));
        let index = state.snapshot();
        let context = state.retriever().retrieve(&index, question, k).await?;
        tracing::debug!("Retrieved {} chunks for context", context.len());
        state
            .generator()
            .answer(question, mode, Some(context.as_slice()))
            .await?
    } else {
        state.generator().answer(question, mode, None).await?
    };

    Ok(Json(ApiResponse::ok(AnswerData::from(answer))))
}

/// POST /api/chatbot/upload - Index uploaded files and answer about them
///
/// Multipart fields: one or more `file`, optional `context` (the question)
/// and `botType`.
pub async fn upload(
    State(state): State<AppState>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Json<ApiResponse<AnswerData>>> {
    let form = UploadForm::read(multipart?).await?;
    if form.files.is_empty() {
        return Err(Error::invalid_input("No file provided"));
    }
    let mode = form.mode();

    tracing::info!(
        "Upload of {} file(s) ({})",
        form.files.len(),
        mode.as_str()
    );

    // Math questions sent as pictures go straight to the vision model
    if mode == BotMode::Math {
        let image = form
            .files
            .iter()
            .find_map(|doc| image_mime(doc).map(|mime| ImageInput::new(mime, doc.data.clone())));
        if let Some(image) = image {
            let question = form.context().unwrap_or(DEFAULT_IMAGE_REQUEST);
            let answer = state.generator().answer_image(question, mode, image).await?;
            return Ok(Json(ApiResponse::ok(AnswerData::from(answer))));
        }
    }

    let question = PromptBuilder::upload_question(form.context());
    let report = state.add_documents(form.files).await?;

    if report.indexed.is_empty() && report.reused.is_empty() {
        let message = report
            .skipped
            .first()
            .map(|f| f.error.clone())
            .unwrap_or_else(|| "No readable files provided".to_string());
        return Err(Error::invalid_input(message));
    }

    let index = state.snapshot();
    let context = state
        .retriever()
        .retrieve_from(
            &index,
            &question,
            state.config().retrieval.top_k,
            &report.document_ids(),
        )
        .await?;
    let answer = state
        .generator()
        .answer(&question, mode, Some(context.as_slice()))
        .await?;

    let mut data = AnswerData::from(answer);
    data.skipped = report.skipped;
    data.indexed = report.indexed;
    Ok(Json(ApiResponse::ok(data)))
}

/// POST /api/chatbot/extract - Plain-text reconstruction of an uploaded file
pub async fn extract(
    State(state): State<AppState>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Json<ApiResponse<ExtractData>>> {
    let form = UploadForm::read(multipart?).await?;
    let doc = form
        .files
        .into_iter()
        .next()
        .ok_or_else(|| Error::invalid_input("No file provided"))?;

    let reader = *state.pipeline().reader();
    let extracted = tokio::task::spawn_blocking(move || reader.read(&doc))
        .await
        .map_err(|e| Error::internal(format!("Reader task failed: {}", e)))??;

    Ok(Json(ApiResponse::ok(ExtractData {
        filename: extracted.filename,
        format: extracted.format,
        mime: extracted.mime,
        text: extracted.text,
    })))
}

/// Body of the history response
#[derive(Debug, serde::Serialize)]
pub struct HistoryData {
    pub history: Vec<HistoryEntry>,
}

/// GET /api/chatbot/history - Fixed sample conversation list
pub async fn history() -> Json<ApiResponse<HistoryData>> {
    let entry = |id: &str, title: &str, timestamp: &str, bot_type| HistoryEntry {
        id: id.to_string(),
        title: title.to_string(),
        timestamp: timestamp.to_string(),
        bot_type,
    };

    Json(ApiResponse::ok(HistoryData {
        history: vec![
            entry("chat1", "Math problem solving", "2023-06-15T10:30:00Z", BotMode::Math),
            entry(
                "chat2",
                "Career advice for software engineering",
                "2023-06-14T15:45:00Z",
                BotMode::Career,
            ),
            entry(
                "chat3",
                "General questions about physics",
                "2023-06-13T09:20:00Z",
                BotMode::Normal,
            ),
        ],
    }))
}

/// Fields of an upload form
#[derive(Debug, Default)]
struct UploadForm {
    files: Vec<Document>,
    context: Option<String>,
    bot_type: Option<String>,
}

impl UploadForm {
    async fn read(mut multipart: Multipart) -> Result<Self> {
        let mut form = Self::default();

        while let Some(field) = multipart.next_field().await.map_err(|e| {
            Error::invalid_input(format!("Failed to read multipart field: {}", e))
        })? {
            let name = field.name().unwrap_or("").to_string();
            match name.as_str() {
                "context" | "botType" => {
                    let value = field.text().await.map_err(|e| {
                        Error::invalid_input(format!("Failed to read {}: {}", name, e))
                    })?;
                    if name == "context" {
                        form.context = Some(value);
                    } else {
                        form.bot_type = Some(value);
                    }
                }
                "file" | "files" => {
                    let filename = field
                        .file_name()
                        .map(|s| s.to_string())
                        .unwrap_or_else(|| format!("upload_{}", Uuid::new_v4()));
                    let mime = field.content_type().map(|s| s.to_string());
                    let data = field.bytes().await.map_err(|e| {
                        Error::invalid_input(format!("Failed to read {}: {}", filename, e))
                    })?;

                    tracing::info!("Received file: {} ({} bytes)", filename, data.len());
                    let doc = Document::new(filename, data);
                    form.files.push(match mime {
                        Some(mime) => doc.with_mime(mime),
                        None => doc,
                    });
                }
                other => tracing::debug!("Ignoring multipart field {:?}", other),
            }
        }

        Ok(form)
    }

    fn mode(&self) -> BotMode {
        self.bot_type
            .as_deref()
            .map(BotMode::from_tag)
            .unwrap_or_default()
    }

    /// Trimmed question, `None` when blank
    fn context(&self) -> Option<&str> {
        self.context
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
    }
}
