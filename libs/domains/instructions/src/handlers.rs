use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use axum_helpers::{
    ValidatedJson,
    errors::responses::{
        BadRequestValidationResponse, DependencyFailureResponse, InternalServerErrorResponse,
        NotFoundResponse,
    },
};
use std::sync::Arc;
use utoipa::OpenApi;

use crate::error::InstructionResult;
use crate::models::{
    AddInstruction, Instruction, ListInstructions, ScoredInstruction, SearchInstructions,
    StatusResponse,
};
use crate::repository::InstructionRepository;
use crate::service::InstructionService;

const INSTRUCTIONS_TAG: &str = "instructions";
const COLLECTIONS_TAG: &str = "collections";

/// OpenAPI documentation for the Instructions API
#[derive(OpenApi)]
#[openapi(
    paths(
        add_instruction,
        get_instruction,
        delete_instruction,
        search_instructions,
        list_collections,
        list_instructions,
    ),
    components(
        schemas(
            Instruction,
            ScoredInstruction,
            AddInstruction,
            SearchInstructions,
            ListInstructions,
            StatusResponse
        ),
        responses(
            NotFoundResponse,
            BadRequestValidationResponse,
            DependencyFailureResponse,
            InternalServerErrorResponse
        )
    ),
    tags(
        (name = INSTRUCTIONS_TAG, description = "System instruction storage and semantic search"),
        (name = COLLECTIONS_TAG, description = "Collection inspection")
    )
)]
pub struct ApiDoc;

/// Create the instructions router with all HTTP endpoints
pub fn router<R: InstructionRepository + 'static>(service: InstructionService<R>) -> Router {
    router_with_shared(Arc::new(service))
}

/// Same as [`router`], for callers that keep their own handle on the service.
pub fn router_with_shared<R: InstructionRepository + 'static>(
    service: Arc<InstructionService<R>>,
) -> Router {
    Router::new()
        .route("/instructions", post(add_instruction))
        .route("/instructions/search", post(search_instructions))
        .route(
            "/instructions/{collection_name}/{instruction_id}",
            get(get_instruction).delete(delete_instruction),
        )
        .route("/collections", get(list_collections))
        .route("/collections/instructions/list", post(list_instructions))
        .with_state(service)
}

/// Embed and store an instruction, overwriting any instruction with the same id
#[utoipa::path(
    post,
    path = "/instructions",
    operation_id = "create_instruction",
    tag = INSTRUCTIONS_TAG,
    request_body = AddInstruction,
    responses(
        (status = 201, description = "Instruction stored", body = StatusResponse),
        (status = 400, response = BadRequestValidationResponse),
        (status = 500, response = DependencyFailureResponse)
    )
)]
async fn add_instruction<R: InstructionRepository>(
    State(service): State<Arc<InstructionService<R>>>,
    ValidatedJson(input): ValidatedJson<AddInstruction>,
) -> InstructionResult<impl IntoResponse> {
    let (collection, instruction) = input.into_instruction();
    let response = service.add_instruction(&collection, instruction).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// Fetch one instruction by id
#[utoipa::path(
    get,
    path = "/instructions/{collection_name}/{instruction_id}",
    tag = INSTRUCTIONS_TAG,
    params(
        ("collection_name" = String, Path, description = "Collection holding the instruction"),
        ("instruction_id" = String, Path, description = "Caller-assigned instruction id")
    ),
    responses(
        (status = 200, description = "Instruction found", body = Instruction),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = DependencyFailureResponse)
    )
)]
async fn get_instruction<R: InstructionRepository>(
    State(service): State<Arc<InstructionService<R>>>,
    Path((collection_name, instruction_id)): Path<(String, String)>,
) -> InstructionResult<Json<Instruction>> {
    let instruction = service
        .get_instruction(&collection_name, &instruction_id)
        .await?;
    Ok(Json(instruction))
}

/// Delete one instruction by id
///
/// Succeeds whether or not the instruction existed.
#[utoipa::path(
    delete,
    path = "/instructions/{collection_name}/{instruction_id}",
    tag = INSTRUCTIONS_TAG,
    params(
        ("collection_name" = String, Path, description = "Collection holding the instruction"),
        ("instruction_id" = String, Path, description = "Caller-assigned instruction id")
    ),
    responses(
        (status = 200, description = "Instruction deleted", body = StatusResponse),
        (status = 500, response = DependencyFailureResponse)
    )
)]
async fn delete_instruction<R: InstructionRepository>(
    State(service): State<Arc<InstructionService<R>>>,
    Path((collection_name, instruction_id)): Path<(String, String)>,
) -> InstructionResult<Json<StatusResponse>> {
    let response = service
        .delete_instruction(&collection_name, &instruction_id)
        .await?;
    Ok(Json(response))
}

/// Semantic search over a collection
#[utoipa::path(
    post,
    path = "/instructions/search",
    tag = INSTRUCTIONS_TAG,
    request_body = SearchInstructions,
    responses(
        (status = 200, description = "Matches, most similar first", body = Vec<ScoredInstruction>),
        (status = 400, response = BadRequestValidationResponse),
        (status = 500, response = DependencyFailureResponse)
    )
)]
async fn search_instructions<R: InstructionRepository>(
    State(service): State<Arc<InstructionService<R>>>,
    ValidatedJson(input): ValidatedJson<SearchInstructions>,
) -> InstructionResult<Json<Vec<ScoredInstruction>>> {
    let results = service
        .search_instructions(&input.collection_name, &input.query, input.limit)
        .await?;
    Ok(Json(results))
}

/// Names of all collections
#[utoipa::path(
    get,
    path = "/collections",
    operation_id = "get_collections_list",
    tag = COLLECTIONS_TAG,
    responses(
        (status = 200, description = "Collection names", body = Vec<String>),
        (status = 500, response = DependencyFailureResponse)
    )
)]
async fn list_collections<R: InstructionRepository>(
    State(service): State<Arc<InstructionService<R>>>,
) -> InstructionResult<Json<Vec<String>>> {
    let names = service.list_collections().await?;
    Ok(Json(names))
}

/// Instructions of one collection, without vectors
#[utoipa::path(
    post,
    path = "/collections/instructions/list",
    operation_id = "get_instructions_list",
    tag = COLLECTIONS_TAG,
    request_body = ListInstructions,
    responses(
        (status = 200, description = "Instructions in store order", body = Vec<Instruction>),
        (status = 400, response = BadRequestValidationResponse),
        (status = 500, response = DependencyFailureResponse)
    )
)]
async fn list_instructions<R: InstructionRepository>(
    State(service): State<Arc<InstructionService<R>>>,
    ValidatedJson(input): ValidatedJson<ListInstructions>,
) -> InstructionResult<Json<Vec<Instruction>>> {
    let instructions = service
        .list_instructions(&input.collection_name, input.limit)
        .await?;
    Ok(Json(instructions))
}
