use async_trait::async_trait;
use quire_api_types::{CreatePostPayload, ImageUploadResponse, Post, UpdatePostPayload};
use reqwest::{
    Method,
    multipart::{Form, Part},
};

use crate::{
    application::repos::{Credentials, ImagesRepo, PostsRepo, RepoError},
    domain::content::PendingImage,
};

use super::BlogApiClient;

/// Owner type sent with every post image upload.
const IMAGE_OWNER_TYPE: &str = "POST";

#[async_trait]
impl PostsRepo for BlogApiClient {
    async fn list_posts_by_user(
        &self,
        auth: &Credentials,
        user_id: &str,
    ) -> Result<Vec<Post>, RepoError> {
        self.get(&format!("posts/user/{user_id}"), auth).await
    }

    async fn get_post(&self, auth: &Credentials, id: &str) -> Result<Post, RepoError> {
        self.get(&format!("posts/{id}"), auth).await
    }

    async fn create_post(
        &self,
        auth: &Credentials,
        payload: &CreatePostPayload,
    ) -> Result<Post, RepoError> {
        self.send_body(Method::POST, "posts", auth, payload).await
    }

    async fn update_post(
        &self,
        auth: &Credentials,
        id: &str,
        payload: &UpdatePostPayload,
    ) -> Result<Post, RepoError> {
        self.send_body(Method::PUT, &format!("posts/{id}"), auth, payload)
            .await
    }

    async fn delete_post(&self, auth: &Credentials, id: &str) -> Result<(), RepoError> {
        self.delete(&format!("posts/{id}"), auth).await
    }
}

#[async_trait]
impl ImagesRepo for BlogApiClient {
    async fn upload_post_image(
        &self,
        auth: &Credentials,
        post_id: &str,
        image: &PendingImage,
    ) -> Result<String, RepoError> {
        let part = Part::bytes(image.bytes.to_vec())
            .file_name(image.file_name.clone())
            .mime_str(&image.content_type)
            .map_err(RepoError::transport)?;
        let form = Form::new()
            .part("image", part)
            .text("postId", post_id.to_string())
            .text("type", IMAGE_OWNER_TYPE);

        let response: ImageUploadResponse = self.send_multipart("images", auth, form).await?;
        Ok(response.image_id)
    }

    async fn delete_image(&self, auth: &Credentials, id: &str) -> Result<(), RepoError> {
        self.delete(&format!("images/{id}"), auth).await
    }
}
