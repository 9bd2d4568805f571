//! Datastar handlers shared by every table managed through a [`ResourceManager`].

use axum::response::{IntoResponse, Response};
use datastar::prelude::ElementPatchMode;

use super::{
    selectors::{MODAL_SLOT, resource_panel},
    shared::{close_modal, finish_stream, render_fragment},
};
use crate::{
    application::{
        error::{AppError, HttpError},
        resource::{
            Confirmation, DeleteOutcome, FormModal, FormMode, Resource, ResourceManager,
            SubmitOutcome,
        },
        stream::StreamBuilder,
        toasts::Notices,
    },
    presentation::admin::views as admin_views,
};

fn open<R: Resource>(manager: &ResourceManager<R>, mode: &FormMode) -> Option<FormModal> {
    match mode {
        FormMode::Create => manager.open_create(),
        FormMode::Edit { id } => manager.open_edit(id),
    }
}

fn push_modal<R: Resource>(
    stream: &mut StreamBuilder,
    manager: &ResourceManager<R>,
    modal: &FormModal,
) -> Result<(), HttpError> {
    let html = render_fragment(
        "infra::http::resources::modal",
        admin_views::ResourceModalTemplate {
            modal: manager.modal_view(modal),
        },
    )?;
    stream.push_patch(html, MODAL_SLOT, ElementPatchMode::Replace);
    Ok(())
}

/// Replace the manager's table with its current rows.
pub(super) fn push_panel<R: Resource>(
    stream: &mut StreamBuilder,
    manager: &ResourceManager<R>,
) -> Result<(), HttpError> {
    let html = render_fragment(
        "infra::http::resources::panel",
        admin_views::ResourcePanelTemplate {
            table: manager.table_view(),
        },
    )?;
    stream.push_patch(html, &resource_panel(manager.key()), ElementPatchMode::Replace);
    Ok(())
}

/// Show the create or edit dialog.
pub(super) fn open_form<R: Resource>(manager: &ResourceManager<R>, mode: FormMode) -> Response {
    let Some(modal) = open(manager, &mode) else {
        return AppError::NotFound.into_response();
    };
    let mut stream = StreamBuilder::new();
    if let Err(err) = push_modal(&mut stream, manager, &modal) {
        return err.into_response();
    }
    stream.into_response()
}

/// Validate and save a dialog submission.
///
/// A saved form closes the dialog and refreshes the table; anything else keeps
/// the dialog open with its errors.
pub(super) async fn submit_form<R: Resource>(
    manager: &ResourceManager<R>,
    mode: FormMode,
    pairs: Vec<(String, String)>,
    notices: &Notices,
) -> Response {
    let Some(mut modal) = open(manager, &mode) else {
        return AppError::NotFound.into_response();
    };
    let outcome = manager.submit(&mut modal, &pairs).await;

    let mut stream = StreamBuilder::new();
    let pushed = match outcome {
        SubmitOutcome::Saved => {
            close_modal(&mut stream).and_then(|()| push_panel(&mut stream, manager))
        }
        SubmitOutcome::Ignored => Ok(()),
        SubmitOutcome::Invalid | SubmitOutcome::Rejected | SubmitOutcome::Failed => {
            push_modal(&mut stream, manager, &modal)
        }
    };
    if let Err(err) = pushed {
        return err.into_response();
    }
    finish_stream(stream, notices)
}

/// Ask for confirmation, then delete and refresh the table.
pub(super) async fn delete_item<R: Resource>(
    manager: &ResourceManager<R>,
    id: &str,
    confirmation: Confirmation,
    notices: &Notices,
) -> Response {
    let Some(result) = manager.delete(id, confirmation).await else {
        return AppError::NotFound.into_response();
    };

    let mut stream = StreamBuilder::new();
    let pushed = match result {
        Ok(DeleteOutcome::ConfirmationRequired(prompt)) => render_fragment(
            "infra::http::resources::confirm",
            admin_views::ConfirmDialogTemplate {
                dialog: manager.confirm_view(id, prompt),
            },
        )
        .map(|html| {
            stream.push_patch(html, MODAL_SLOT, ElementPatchMode::Replace);
        }),
        Ok(DeleteOutcome::Deleted) => {
            close_modal(&mut stream).and_then(|()| push_panel(&mut stream, manager))
        }
        Err(_) => close_modal(&mut stream),
    };
    if let Err(err) = pushed {
        return err.into_response();
    }
    finish_stream(stream, notices)
}
