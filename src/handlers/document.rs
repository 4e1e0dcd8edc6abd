use crate::domain::AuthUser;
use crate::models::*;
use crate::services::DocumentService;
use actix_web::http::header::{ContentDisposition, DispositionParam, DispositionType};
use actix_web::{HttpResponse, ResponseError, Result, web};

fn html_response(document: RenderedDocument, download: bool) -> HttpResponse {
    let disposition = ContentDisposition {
        disposition: if download {
            DispositionType::Attachment
        } else {
            DispositionType::Inline
        },
        parameters: vec![DispositionParam::Filename(document.file_name())],
    };
    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .insert_header(disposition)
        .body(document.html)
}

#[utoipa::path(
    get,
    path = "/documents/invoice/{order_id}",
    tag = "document",
    params(
        ("order_id" = i64, Path, description = "Order id"),
        DocumentQuery
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Invoice HTML", body = String, content_type = "text/html"),
        (status = 403, description = "Not the caller's order", body = ApiError),
        (status = 404, description = "Order not found", body = ApiError)
    )
)]
pub async fn invoice(
    document_service: web::Data<DocumentService>,
    user: AuthUser,
    path: web::Path<i64>,
    query: web::Query<DocumentQuery>,
) -> Result<HttpResponse> {
    match document_service
        .render_invoice(&user, path.into_inner())
        .await
    {
        Ok(document) => Ok(html_response(document, query.wants_download())),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/documents/receipt/{payment_id}",
    tag = "document",
    params(
        ("payment_id" = i64, Path, description = "Payment id"),
        DocumentQuery
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Receipt HTML", body = String, content_type = "text/html"),
        (status = 403, description = "Not the caller's payment", body = ApiError),
        (status = 404, description = "Payment not found", body = ApiError)
    )
)]
pub async fn receipt(
    document_service: web::Data<DocumentService>,
    user: AuthUser,
    path: web::Path<i64>,
    query: web::Query<DocumentQuery>,
) -> Result<HttpResponse> {
    match document_service
        .render_receipt(&user, path.into_inner())
        .await
    {
        Ok(document) => Ok(html_response(document, query.wants_download())),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn document_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/documents")
            .route("/invoice/{order_id}", web::get().to(invoice))
            .route("/receipt/{payment_id}", web::get().to(receipt)),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::header::CONTENT_DISPOSITION;

    fn document() -> RenderedDocument {
        RenderedDocument {
            kind: DocumentKind::Invoice,
            reference: "ORD-0001".to_string(),
            html: "<html></html>".to_string(),
        }
    }

    #[test]
    fn test_download_sets_attachment() {
        let response = html_response(document(), true);
        let header = response.headers().get(CONTENT_DISPOSITION).unwrap();
        assert_eq!(
            header.to_str().unwrap(),
            "attachment; filename=\"invoice-ORD-0001.html\""
        );
    }

    #[test]
    fn test_default_is_inline() {
        let response = html_response(document(), false);
        let header = response.headers().get(CONTENT_DISPOSITION).unwrap();
        assert!(header.to_str().unwrap().starts_with("inline"));
    }
}
