use uuid::Uuid;

use federation_core::trace::TraceContext;
use federation_posts::error::PostsServiceError;
use federation_posts::usecase::post::{
    CreatePostInput, CreatePostUseCase, GetPostUseCase, ListUserPostsUseCase,
};
use federation_posts::usecase::user_representation::CreateUserRepresentationUseCase;

use crate::helpers::{MockPostRepo, MockUserRepresentationRepo};

fn input(user_id: Uuid, title: &str) -> CreatePostInput {
    CreatePostInput {
        user_id,
        title: title.into(),
        content: "body".into(),
    }
}

#[tokio::test]
async fn should_reject_post_by_unknown_author() {
    let posts = MockPostRepo::default();
    let handle = posts.posts_handle();
    let usecase = CreatePostUseCase { posts };

    let result = usecase
        .execute(TraceContext::new(), input(Uuid::now_v7(), "hello"))
        .await;

    assert!(
        matches!(result, Err(PostsServiceError::UserNotFound)),
        "expected UserNotFound, got {result:?}"
    );
    assert!(handle.lock().unwrap().is_empty());
}

#[tokio::test]
async fn should_reject_blank_title_before_touching_storage() {
    let user_id = Uuid::now_v7();
    let posts = MockPostRepo::with_author(user_id);
    let handle = posts.posts_handle();
    let usecase = CreatePostUseCase { posts };

    let result = usecase
        .execute(TraceContext::new(), input(user_id, "   "))
        .await;

    assert!(matches!(result, Err(PostsServiceError::InvalidTitle)));
    assert!(handle.lock().unwrap().is_empty());
}

#[tokio::test]
async fn should_create_post_for_known_author() {
    let user_id = Uuid::now_v7();
    let posts = MockPostRepo::with_author(user_id);
    let handle = posts.posts_handle();
    let usecase = CreatePostUseCase { posts };

    let post = usecase
        .execute(TraceContext::new(), input(user_id, " hello "))
        .await
        .unwrap();

    assert_eq!(post.title, "hello");
    assert_eq!(post.user_id, Some(user_id));
    assert_eq!(handle.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn should_return_post_not_found() {
    let usecase = GetPostUseCase {
        posts: MockPostRepo::default(),
    };
    let result = usecase.execute(Uuid::now_v7()).await;
    assert!(matches!(result, Err(PostsServiceError::PostNotFound)));
}

#[tokio::test]
async fn should_accept_repeated_user_created_event() {
    let user_id = Uuid::now_v7();
    let usecase = CreateUserRepresentationUseCase {
        users: MockUserRepresentationRepo::default(),
    };

    usecase.execute(TraceContext::new(), user_id).await.unwrap();
    usecase.execute(TraceContext::new(), user_id).await.unwrap();

    assert_eq!(usecase.users.users.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn should_not_list_posts_of_unknown_user() {
    let usecase = ListUserPostsUseCase {
        posts: MockPostRepo::default(),
        users: MockUserRepresentationRepo::default(),
    };
    let result = usecase.execute(Uuid::now_v7()).await;
    assert!(matches!(result, Err(PostsServiceError::UserNotFound)));
}
