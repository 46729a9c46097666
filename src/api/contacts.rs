//! Contacts API handlers
//!
//! `ContactService` owns the store and is handed to the router as state.
//! GET returns the whole collection, POST appends one contact, and every other
//! method (HEAD included) is refused with 403.

use crate::error::AppError;
use crate::state::{Contact, ContactStore, StoreError};
use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, State},
    http::{header, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{any, MethodRouter},
};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Shared handle to the contacts service
pub type SharedContactService = Arc<ContactService>;

/// Mediates all access to the contact store
#[derive(Debug)]
pub struct ContactService {
    store: RwLock<ContactStore>,
}

impl ContactService {
    /// Create a service over a freshly seeded store
    pub fn new() -> Result<Self, StoreError> {
        Ok(Self::with_store(ContactStore::new()?))
    }

    /// Create a service over an existing store
    pub fn with_store(store: ContactStore) -> Self {
        Self {
            store: RwLock::new(store),
        }
    }

    /// Serialize the current store to JSON
    pub async fn snapshot_json(&self) -> Result<Vec<u8>, AppError> {
        let store = self.store.read().await;
        store
            .to_json()
            .map_err(|e| AppError::Serialization(e.to_string()))
    }

    /// Append a contact, returning the new store size
    pub async fn append(&self, contact: Contact) -> usize {
        let mut store = self.store.write().await;
        store.append(contact);
        store.len()
    }

    /// Number of contacts currently stored
    pub async fn count(&self) -> usize {
        self.store.read().await.len()
    }

    /// Copy of all contacts in insertion order
    pub async fn contacts(&self) -> Vec<Contact> {
        self.store.read().await.contacts().to_vec()
    }

    /// Build the method router for the contacts route
    ///
    /// Every method goes to [`dispatch`]. axum's own `get` routing would also
    /// answer HEAD, which must be refused here.
    pub fn into_method_router(self: Arc<Self>) -> MethodRouter {
        any(dispatch).with_state(self)
    }
}

/// ANY /contacts - Route by method: GET lists, POST appends, the rest get 403
pub async fn dispatch(
    State(service): State<SharedContactService>,
    method: Method,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    match method {
        Method::GET => list_contacts(State(service)).await.into_response(),
        Method::POST => create_contact(State(service), body).await.into_response(),
        other => reject_method(other).into_response(),
    }
}

/// GET /contacts - List all contacts
pub async fn list_contacts(
    State(service): State<SharedContactService>,
) -> Result<impl IntoResponse, AppError> {
    let body = service.snapshot_json().await?;
    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/json")],
        body,
    ))
}

/// POST /contacts - Append a contact
///
/// The body is read and parsed by hand so that both an unreadable body and a
/// body of the wrong shape answer 400 with nothing in it.
pub async fn create_contact(
    State(service): State<SharedContactService>,
    body: Result<Bytes, BytesRejection>,
) -> Result<StatusCode, AppError> {
    let body = body.map_err(|e| AppError::UnreadableBody(e.body_text()))?;
    let contact = Contact::from_json(&body)?;

    let count = service.append(contact).await;
    tracing::debug!(count, "Contact appended");

    Ok(StatusCode::OK)
}

/// Any other method on /contacts
pub fn reject_method(method: Method) -> AppError {
    AppError::MethodNotAllowed(method.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_service() -> SharedContactService {
        Arc::new(ContactService::new().expect("seed should parse"))
    }

    async fn list_body(service: &SharedContactService) -> serde_json::Value {
        let response = list_contacts(State(service.clone()))
            .await
            .unwrap()
            .into_response();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/json"
        );
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_list_contacts_seed() {
        let service = create_test_service();
        let body = list_body(&service).await;

        let contacts = body["contacts"].as_array().unwrap();
        assert_eq!(contacts.len(), 1);
        assert_eq!(contacts[0]["name"], "郭仲杰");
        assert_eq!(contacts[0]["email"], "authurguo@tencent.com");
    }

    #[tokio::test]
    async fn test_create_contact() {
        let service = create_test_service();
        let body = Bytes::from_static(br#"{"name":"A","title":"Engineer"}"#);

        let status = create_contact(State(service.clone()), Ok(body))
            .await
            .unwrap();
        assert_eq!(status, StatusCode::OK);
        assert_eq!(service.count().await, 2);

        let contacts = service.contacts().await;
        assert_eq!(contacts[1].name, "A");
        assert_eq!(contacts[1].title, "Engineer");
        assert_eq!(contacts[1].department, "");
    }

    #[tokio::test]
    async fn test_create_contact_invalid_json() {
        let service = create_test_service();
        let body = Bytes::from_static(br#""not json""#);

        let result = create_contact(State(service.clone()), Ok(body)).await;
        match result {
            Err(AppError::InvalidContact(_)) => {
                // Expected error
            }
            other => panic!("Expected InvalidContact error, got: {:?}", other),
        }
        assert_eq!(service.count().await, 1);
    }

    #[tokio::test]
    async fn test_create_contact_empty_body() {
        let service = create_test_service();
        let result = create_contact(State(service.clone()), Ok(Bytes::new())).await;

        assert_eq!(result.unwrap_err().status(), StatusCode::BAD_REQUEST);
        assert_eq!(service.count().await, 1);
    }

    #[test]
    fn test_reject_method() {
        let err = reject_method(Method::DELETE);
        assert_eq!(err.status(), StatusCode::FORBIDDEN);
        assert_eq!(err.to_string(), "Method not allowed: DELETE");
    }

    #[tokio::test]
    async fn test_dispatch_routes_by_method() {
        let service = create_test_service();
        let body = || -> Result<Bytes, BytesRejection> {
            Ok(Bytes::from_static(br#"{"name":"Routed"}"#))
        };

        let get = dispatch(State(service.clone()), Method::GET, body()).await;
        assert_eq!(get.status(), StatusCode::OK);

        let post = dispatch(State(service.clone()), Method::POST, body()).await;
        assert_eq!(post.status(), StatusCode::OK);
        assert_eq!(service.count().await, 2);

        for method in [Method::HEAD, Method::PUT, Method::DELETE, Method::OPTIONS] {
            let response = dispatch(State(service.clone()), method.clone(), body()).await;
            assert_eq!(
                response.status(),
                StatusCode::FORBIDDEN,
                "{} should be refused",
                method
            );
            let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
                .await
                .unwrap();
            assert!(bytes.is_empty());
        }
        assert_eq!(service.count().await, 2);
    }

    #[tokio::test]
    async fn test_create_contact_follows_lenient_decoding() {
        let service = create_test_service();

        let payloads: [&'static [u8]; 3] = [
            b"null",
            br#"{"name":"a","name":"b"}"#,
            br#"{"Name":"Cased"}"#,
        ];
        for payload in payloads {
            let status = create_contact(State(service.clone()), Ok(Bytes::from_static(payload)))
                .await
                .unwrap();
            assert_eq!(status, StatusCode::OK);
        }

        let names: Vec<String> = service
            .contacts()
            .await
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["郭仲杰", "", "b", "Cased"]);
    }

    #[tokio::test]
    async fn test_list_contacts_is_stable_without_writes() {
        let service = create_test_service();
        let first = service.snapshot_json().await.unwrap();
        let second = service.snapshot_json().await.unwrap();
        assert_eq!(first, second);
    }
}
