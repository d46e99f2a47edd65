//! Behaviour shared by every backend. Each scenario starts from an empty
//! store and drives the public services only.
#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::Arc;

use anyhow::Result;
use feedstore_core::CoreError;
use feedstore_core::application::Services;
use feedstore_core::application::requests::{
    DeleteFeed, Follow, GetAccountFeeds, LikeFeed, PostFeed, RegisterImage,
    UnlikeFeed, Unfollow, UpdateFeed, ViewFeeds,
};
use feedstore_core::database::ports::feeds::FeedsRepository;
use feedstore_core::database::ports::images::ImagesRepository;
use feedstore_core::database::{ScopeState, UnitOfWorkFactory, scoped};
use feedstore_model::{
    AccountId, Feed, FeedID, Follower, Image, ImageID, ImageSlot, Like, Page,
    Pagination,
};

pub fn services(factory: Arc<dyn UnitOfWorkFactory>) -> Services {
    Services::new(factory)
}

pub fn account(name: &str) -> AccountId {
    AccountId::new(name).expect("valid account id")
}

pub async fn upload(
    services: &Services,
    owner: &AccountId,
) -> feedstore_core::Result<Image> {
    services
        .images
        .register_image(RegisterImage {
            image_id: None,
            uploader: owner.clone(),
            url: format!("https://cdn.test/{}", ImageID::new()),
            blurhash: None,
        })
        .await
}

pub async fn post(
    services: &Services,
    author: &AccountId,
    text: &str,
    images: &[ImageID],
) -> feedstore_core::Result<Feed> {
    services
        .feeds
        .post_feed(PostFeed {
            account_id: author.clone(),
            text: text.to_string(),
            images: ImageSlot::sequential(images.iter().copied()),
        })
        .await
}

fn ids(feed: &Feed) -> Vec<ImageID> {
    feed.images.iter().map(|image| image.image_id).collect()
}

pub async fn post_feed_binds_images_in_order(services: &Services) -> Result<()> {
    let alice = account("alice");
    let first = upload(services, &alice).await?;
    let second = upload(services, &alice).await?;

    let feed = post(
        services,
        &alice,
        "two pictures",
        &[second.image_id, first.image_id],
    )
    .await?;

    assert_eq!(ids(&feed), vec![second.image_id, first.image_id]);
    assert!(feed.images.iter().all(|i| i.feed_id == Some(feed.feed_id)));
    assert_eq!(feed.images[0].order, 0);
    assert_eq!(feed.images[1].order, 1);

    let stored = services.images.get_image(first.image_id).await?;
    assert_eq!(stored.and_then(|i| i.feed_id), Some(feed.feed_id));
    Ok(())
}

pub async fn update_feed_rebinds_images(services: &Services) -> Result<()> {
    let alice = account("alice");
    let a = upload(services, &alice).await?;
    let b = upload(services, &alice).await?;
    let c = upload(services, &alice).await?;

    let feed = post(services, &alice, "before", &[a.image_id, b.image_id]).await?;
    let updated = services
        .feeds
        .update_feed(UpdateFeed {
            account_id: alice.clone(),
            feed_id: feed.feed_id,
            text: "after".into(),
            images: ImageSlot::sequential([c.image_id, a.image_id]),
        })
        .await?;

    assert_eq!(updated.text, "after");
    assert!(updated.updated_at.is_some());
    assert_eq!(ids(&updated), vec![c.image_id, a.image_id]);
    assert_eq!(updated.images[1].order, 1);

    let dropped = services.images.get_image(b.image_id).await?;
    assert_eq!(dropped.map(|i| i.feed_id), Some(None));

    let reread = services.feeds.get_feed(feed.feed_id, None).await?;
    assert_eq!(reread.map(|f| ids(&f)), Some(vec![c.image_id, a.image_id]));
    Ok(())
}

pub async fn only_the_author_may_change_a_feed(services: &Services) -> Result<()> {
    let alice = account("alice");
    let mallory = account("mallory");
    let feed = post(services, &alice, "mine", &[]).await?;

    let update = services
        .feeds
        .update_feed(UpdateFeed {
            account_id: mallory.clone(),
            feed_id: feed.feed_id,
            text: "hijacked".into(),
            images: Vec::new(),
        })
        .await;
    assert!(matches!(update, Err(CoreError::Forbidden(_))));

    let delete = services
        .feeds
        .delete_feed(DeleteFeed {
            account_id: mallory,
            feed_id: feed.feed_id,
        })
        .await;
    assert!(matches!(delete, Err(CoreError::Forbidden(_))));

    let still = services.feeds.get_feed(feed.feed_id, None).await?;
    assert_eq!(still.map(|f| f.text), Some("mine".to_string()));
    Ok(())
}

pub async fn failed_post_leaves_no_trace(services: &Services) -> Result<()> {
    let alice = account("alice");
    let bob = account("bob");
    let free = upload(services, &alice).await?;
    let taken = upload(services, &alice).await?;
    let foreign = upload(services, &bob).await?;
    post(services, &alice, "first", &[taken.image_id]).await?;

    let reused = post(services, &alice, "second", &[free.image_id, taken.image_id]).await;
    assert!(matches!(reused, Err(CoreError::InvariantViolation(_))));

    let stolen = post(services, &alice, "third", &[foreign.image_id]).await;
    assert!(matches!(stolen, Err(CoreError::NotFound(_))));

    let free_now = services.images.get_image(free.image_id).await?;
    assert_eq!(free_now.map(|i| i.feed_id), Some(None));

    let page = services
        .feeds
        .get_account_feeds(GetAccountFeeds {
            account_id: alice,
            pagination: Pagination::default(),
            viewer: None,
        })
        .await?;
    assert_eq!(page.total_count, 1);
    Ok(())
}

pub async fn delete_feed_cascades(services: &Services) -> Result<()> {
    let alice = account("alice");
    let bob = account("bob");
    let image = upload(services, &alice).await?;
    let feed = post(services, &alice, "short lived", &[image.image_id]).await?;

    services
        .likes
        .like(LikeFeed {
            feed_id: feed.feed_id,
            account_id: bob.clone(),
        })
        .await?;
    services
        .views
        .view_feeds(ViewFeeds {
            account_id: bob.clone(),
            feed_ids: vec![feed.feed_id],
        })
        .await?;

    let request = DeleteFeed {
        account_id: alice.clone(),
        feed_id: feed.feed_id,
    };
    assert!(services.feeds.delete_feed(request.clone()).await?);
    assert!(!services.feeds.delete_feed(request).await?);

    assert!(services.feeds.get_feed(feed.feed_id, None).await?.is_none());
    let orphan = services.images.get_image(image.image_id).await?;
    assert_eq!(orphan.map(|i| i.feed_id), Some(None));

    let likes = services
        .likes
        .get_likes(feed.feed_id, Pagination::default())
        .await?;
    assert_eq!(likes.total_count, 0);

    let view = services
        .views
        .view_feeds(ViewFeeds {
            account_id: bob,
            feed_ids: vec![feed.feed_id],
        })
        .await;
    assert!(matches!(view, Err(CoreError::NotFound(_))));
    Ok(())
}

pub async fn follow_is_idempotent(services: &Services) -> Result<()> {
    let alice = account("alice");
    let bob = account("bob");
    let request = Follow {
        follower: alice.clone(),
        follow_for: bob.clone(),
    };

    let first = services.followers.follow(request.clone()).await?;
    let second = services.followers.follow(request).await?;
    assert_eq!(first.followed_at, second.followed_at);

    let own = services
        .followers
        .follow(Follow {
            follower: alice.clone(),
            follow_for: alice.clone(),
        })
        .await;
    assert!(matches!(own, Err(CoreError::InvariantViolation(_))));

    let unfollow = Unfollow {
        follower: alice,
        follow_for: bob,
    };
    assert!(services.followers.unfollow(unfollow.clone()).await?);
    assert!(!services.followers.unfollow(unfollow).await?);
    Ok(())
}

pub async fn account_info_counts_edges_and_feeds(services: &Services) -> Result<()> {
    let a = account("a");
    let b = account("b");
    let c = account("c");
    for (follower, follow_for) in [(&a, &b), (&c, &b), (&b, &a)] {
        services
            .followers
            .follow(Follow {
                follower: follower.clone(),
                follow_for: follow_for.clone(),
            })
            .await?;
    }
    post(services, &b, "one", &[]).await?;
    post(services, &b, "two", &[]).await?;

    let info = services.followers.get_account_info(b.clone()).await?;
    assert_eq!(info.followers_count, 2);
    assert_eq!(info.following_count, 1);
    assert_eq!(info.feeds_count, 2);

    let followers = services
        .followers
        .get_followers(b.clone(), Pagination::default())
        .await?;
    let names: HashSet<String> =
        followers.items.iter().map(|f| f.follower.to_string()).collect();
    assert_eq!(names, HashSet::from(["a".to_string(), "c".to_string()]));

    let following = services
        .followers
        .get_following(b, Pagination::default())
        .await?;
    assert_eq!(following.total_count, 1);
    assert_eq!(following.items[0].follow_for, a);

    let nobody = services.followers.get_account_info(account("nobody")).await?;
    assert_eq!(nobody.followers_count + nobody.following_count + nobody.feeds_count, 0);
    Ok(())
}

pub async fn viewer_flags_follow_the_viewer(services: &Services) -> Result<()> {
    let author = account("author");
    let fan = account("fan");
    let stranger = account("stranger");
    let feed = post(services, &author, "hello", &[]).await?;

    services
        .followers
        .follow(Follow {
            follower: fan.clone(),
            follow_for: author.clone(),
        })
        .await?;
    services
        .likes
        .like(LikeFeed {
            feed_id: feed.feed_id,
            account_id: fan.clone(),
        })
        .await?;

    let as_fan = services.feeds.get_feed(feed.feed_id, Some(fan)).await?;
    let as_fan = as_fan.expect("feed exists");
    assert!(as_fan.has_followed && as_fan.has_liked);
    assert_eq!(as_fan.likes_count, 1);

    for viewer in [None, Some(stranger)] {
        let feed = services.feeds.get_feed(feed.feed_id, viewer).await?;
        let feed = feed.expect("feed exists");
        assert!(!feed.has_followed && !feed.has_liked);
        assert_eq!(feed.likes_count, 1);
    }
    Ok(())
}

pub async fn like_and_unlike_are_idempotent(services: &Services) -> Result<()> {
    let author = account("author");
    let fan = account("fan");
    let feed = post(services, &author, "likeable", &[]).await?;
    let like = LikeFeed {
        feed_id: feed.feed_id,
        account_id: fan.clone(),
    };

    let first = services.likes.like(like.clone()).await?;
    let second = services.likes.like(like).await?;
    assert_eq!(first.liked_at, second.liked_at);

    let likes = services
        .likes
        .get_likes(feed.feed_id, Pagination::default())
        .await?;
    assert_eq!(likes.total_count, 1);

    let unlike = UnlikeFeed {
        feed_id: feed.feed_id,
        account_id: fan.clone(),
    };
    assert!(services.likes.unlike(unlike.clone()).await?);
    assert!(!services.likes.unlike(unlike).await?);

    let missing = services
        .likes
        .like(LikeFeed {
            feed_id: FeedID::new(),
            account_id: fan,
        })
        .await;
    assert!(matches!(missing, Err(CoreError::NotFound(_))));
    Ok(())
}

pub async fn views_count_distinct_accounts(services: &Services) -> Result<()> {
    let author = account("author");
    let feed = post(services, &author, "seen", &[]).await?;

    let view = |who: &str| ViewFeeds {
        account_id: account(who),
        feed_ids: vec![feed.feed_id, feed.feed_id],
    };
    assert_eq!(services.views.view_feeds(view("a")).await?, 1);
    assert_eq!(services.views.view_feeds(view("a")).await?, 0);
    assert_eq!(services.views.view_feeds(view("b")).await?, 1);

    let stored = services.feeds.get_feed(feed.feed_id, None).await?;
    assert_eq!(stored.map(|f| f.views_count), Some(2));
    Ok(())
}

pub async fn pages_partition_account_feeds(services: &Services) -> Result<()> {
    let author = account("prolific");
    let mut posted = HashSet::new();
    for n in 0..5 {
        posted.insert(post(services, &author, &format!("feed {n}"), &[]).await?.feed_id);
    }

    let mut seen = Vec::new();
    for offset in [0, 2, 4] {
        let page = services
            .feeds
            .get_account_feeds(GetAccountFeeds {
                account_id: author.clone(),
                pagination: Pagination::new(2, offset),
                viewer: None,
            })
            .await?;
        assert_eq!(page.total_count, 5);
        seen.extend(page.items);
    }

    assert!(seen.windows(2).all(|w| w[0].created_at >= w[1].created_at));
    let ids: HashSet<FeedID> = seen.iter().map(|f| f.feed_id).collect();
    assert_eq!(seen.len(), 5);
    assert_eq!(ids, posted);

    let past_end = services
        .feeds
        .get_account_feeds(GetAccountFeeds {
            account_id: author,
            pagination: Pagination::new(2, 10),
            viewer: None,
        })
        .await?;
    assert!(past_end.is_empty());
    assert_eq!(past_end.total_count, 5);
    Ok(())
}

pub async fn get_feeds_keeps_request_order(services: &Services) -> Result<()> {
    let author = account("author");
    let first = post(services, &author, "first", &[]).await?;
    let second = post(services, &author, "second", &[]).await?;

    let feeds = services
        .feeds
        .get_feeds(vec![second.feed_id, FeedID::new(), first.feed_id], None)
        .await?;
    let order: Vec<FeedID> = feeds.iter().map(|f| f.feed_id).collect();
    assert_eq!(order, vec![second.feed_id, first.feed_id]);
    Ok(())
}

pub async fn duplicate_image_id_conflicts(services: &Services) -> Result<()> {
    let alice = account("alice");
    let image_id = ImageID::new();
    let register = || RegisterImage {
        image_id: Some(image_id),
        uploader: alice.clone(),
        url: "https://cdn.test/fixed".into(),
        blurhash: Some("LEHV6nWB2yk8".into()),
    };

    let stored = services.images.register_image(register()).await?;
    assert_eq!(stored.image_id, image_id);
    assert!(stored.feed_id.is_none());

    let again = services.images.register_image(register()).await;
    assert!(matches!(again, Err(CoreError::Conflict(_))));
    Ok(())
}

pub async fn update_feed_keeps_retained_image_order(
    services: &Services,
) -> Result<()> {
    let alice = account("alice");
    let i1 = upload(services, &alice).await?.image_id;
    let i2 = upload(services, &alice).await?.image_id;
    let i3 = upload(services, &alice).await?.image_id;
    let i4 = upload(services, &alice).await?.image_id;

    let feed = post(services, &alice, "three", &[i1, i2, i3]).await?;
    let updated = services
        .feeds
        .update_feed(UpdateFeed {
            account_id: alice.clone(),
            feed_id: feed.feed_id,
            text: "two".into(),
            images: vec![ImageSlot::new(i4, 0), ImageSlot::new(i2, 1)],
        })
        .await?;
    assert_eq!(ids(&updated), vec![i4, i2]);

    let kept = services.images.get_image(i2).await?.expect("i2 exists");
    assert_eq!(kept.feed_id, Some(feed.feed_id));
    assert_eq!(kept.order, 1);

    let added = services.images.get_image(i4).await?.expect("i4 exists");
    assert_eq!((added.feed_id, added.order), (Some(feed.feed_id), 0));

    for dropped in [i1, i3] {
        let image = services.images.get_image(dropped).await?;
        assert_eq!(image.map(|i| i.feed_id), Some(None));
    }
    Ok(())
}

async fn follow(
    services: &Services,
    from: &AccountId,
    to: &AccountId,
) -> Result<Follower> {
    Ok(services
        .followers
        .follow(Follow {
            follower: from.clone(),
            follow_for: to.clone(),
        })
        .await?)
}

pub async fn follow_edges_with_colons_stay_distinct(services: &Services) -> Result<()> {
    let a_b = account("a:b");
    let c = account("c");
    let a = account("a");
    let b_c = account("b:c");

    follow(services, &a_b, &c).await?;
    let second = follow(services, &a, &b_c).await?;
    assert_eq!(second.follower, a);
    assert_eq!(second.follow_for, b_c);

    for who in [&c, &b_c] {
        let info = services.followers.get_account_info(who.clone()).await?;
        assert_eq!(info.followers_count, 1, "followers of {who}");
    }
    for who in [&a, &a_b] {
        let info = services.followers.get_account_info(who.clone()).await?;
        assert_eq!(info.following_count, 1, "following of {who}");
    }

    let feed = post(services, &b_c, "colons", &[]).await?;
    let as_a = services.feeds.get_feed(feed.feed_id, Some(a.clone())).await?;
    assert!(as_a.expect("feed exists").has_followed);
    let as_a_b = services.feeds.get_feed(feed.feed_id, Some(a_b)).await?;
    assert!(!as_a_b.expect("feed exists").has_followed);

    let other = post(services, &c, "plain", &[]).await?;
    let as_a = services.feeds.get_feed(other.feed_id, Some(a)).await?;
    assert!(!as_a.expect("feed exists").has_followed);
    Ok(())
}

/// Walks a five-record listing two at a time and checks the pages tile it.
async fn walk_pages<T, F, Fut, K>(fetch: F, key: K) -> Result<Vec<T>>
where
    F: Fn(Pagination) -> Fut,
    Fut: std::future::Future<Output = feedstore_core::Result<Page<T>>>,
    K: Fn(&T) -> String,
{
    let mut seen = Vec::new();
    for offset in [0, 2, 4] {
        let page = fetch(Pagination::new(2, offset)).await?;
        assert_eq!(page.total_count, 5);
        assert_eq!(page.len(), if offset == 4 { 1 } else { 2 });
        seen.extend(page.items);
    }
    let distinct: HashSet<String> = seen.iter().map(&key).collect();
    assert_eq!(distinct.len(), 5, "pages overlap");
    Ok(seen)
}

pub async fn follower_pages_are_newest_first(services: &Services) -> Result<()> {
    let star = account("star");
    let fan = account("fan");
    for n in 0..5 {
        follow(services, &account(&format!("follower-{n}")), &star).await?;
        follow(services, &fan, &account(&format!("idol-{n}"))).await?;
    }

    let followers = walk_pages(
        |window| services.followers.get_followers(star.clone(), window),
        |edge: &Follower| edge.follower.to_string(),
    )
    .await?;
    assert!(followers.windows(2).all(|w| w[0].followed_at >= w[1].followed_at));
    assert_eq!(followers[0].follower, account("follower-4"));

    let following = walk_pages(
        |window| services.followers.get_following(fan.clone(), window),
        |edge: &Follower| edge.follow_for.to_string(),
    )
    .await?;
    assert!(following.windows(2).all(|w| w[0].followed_at >= w[1].followed_at));
    assert_eq!(following[4].follow_for, account("idol-0"));
    Ok(())
}

pub async fn like_pages_are_newest_first(services: &Services) -> Result<()> {
    let author = account("author");
    let feed = post(services, &author, "popular", &[]).await?;
    for n in 0..5 {
        services
            .likes
            .like(LikeFeed {
                feed_id: feed.feed_id,
                account_id: account(&format!("fan-{n}")),
            })
            .await?;
    }

    let likes = walk_pages(
        |window| services.likes.get_likes(feed.feed_id, window),
        |like: &Like| like.account_id.to_string(),
    )
    .await?;
    assert!(likes.windows(2).all(|w| w[0].liked_at >= w[1].liked_at));
    assert_eq!(likes[0].account_id, account("fan-4"));
    assert!(likes.iter().all(|like| like.feed_id == feed.feed_id));
    Ok(())
}

pub async fn rollback_discards_staged_writes(
    factory: Arc<dyn UnitOfWorkFactory>,
) -> Result<()> {
    let alice = account("alice");
    let feed = Feed::new(FeedID::new(), alice.clone(), "never committed");

    let mut uow = factory.create();
    uow.enter().await?;
    uow.feeds()?.add(&feed).await?;
    assert!(uow.feeds()?.exists(feed.feed_id).await?);
    uow.rollback().await?;
    uow.exit(false).await?;

    let mut check = factory.create();
    check.enter().await?;
    assert!(!check.feeds()?.exists(feed.feed_id).await?);
    assert_eq!(check.feeds()?.count_feeds(&alice).await?, 0);
    check.exit(false).await?;
    Ok(())
}

pub async fn failed_work_is_rolled_back(
    factory: Arc<dyn UnitOfWorkFactory>,
) -> Result<()> {
    let bob = account("bob");
    let image = Image::new(bob, "https://cdn.test/x", None);
    let image_id = image.image_id;

    let outcome: feedstore_core::Result<()> =
        scoped(factory.create(), move |uow| {
            Box::pin(async move {
                uow.images()?.add(&image).await?;
                Err::<(), _>(CoreError::Internal("abort".into()))
            })
        })
        .await;
    assert!(matches!(outcome, Err(CoreError::Internal(_))));

    let found = scoped(factory.create(), move |uow| {
        Box::pin(async move { uow.images()?.get_by_id(image_id).await })
    })
    .await?;
    assert!(found.is_none());
    Ok(())
}

pub async fn scope_lifecycle_is_enforced(
    factory: Arc<dyn UnitOfWorkFactory>,
) -> Result<()> {
    let mut uow = factory.create();
    assert_eq!(uow.state(), ScopeState::Idle);
    assert!(matches!(uow.feeds(), Err(CoreError::ScopeState(_))));
    assert!(uow.commit().await.is_err());

    uow.enter().await?;
    assert!(matches!(uow.enter().await, Err(CoreError::ScopeState(_))));

    uow.commit().await?;
    assert_eq!(uow.state(), ScopeState::Committed);
    uow.commit().await?;
    uow.rollback().await?;
    assert_eq!(uow.state(), ScopeState::Committed);
    assert!(uow.feeds().is_err());

    uow.exit(false).await?;
    assert_eq!(uow.state(), ScopeState::Closed);
    uow.exit(true).await?;
    assert!(uow.enter().await.is_err());
    assert!(uow.rollback().await.is_err());
    Ok(())
}

async fn store_image(
    factory: &Arc<dyn UnitOfWorkFactory>,
    image: Image,
) -> feedstore_core::Result<()> {
    scoped(factory.create(), move |uow| {
        Box::pin(async move { uow.images()?.add(&image).await })
    })
    .await
}

pub async fn image_update_rejects_unknown_ids(
    factory: Arc<dyn UnitOfWorkFactory>,
) -> Result<()> {
    let carol = account("carol");
    let stored = Image::new(carol.clone(), "https://cdn.test/stored", None);
    let stored_id = stored.image_id;
    store_image(&factory, stored.clone()).await?;

    let staged = Image::new(carol.clone(), "https://cdn.test/staged", None);
    let staged_id = staged.image_id;
    let mut changed = stored;
    changed.blurhash = Some("L6PZfSi_.AyE".into());
    let ghost = Image::new(carol, "https://cdn.test/ghost", None);
    let ghost_id = ghost.image_id;

    let outcome = scoped(factory.create(), move |uow| {
        Box::pin(async move {
            uow.images()?.add(&staged).await?;
            uow.images()?.update(&[changed, ghost]).await
        })
    })
    .await;
    match outcome {
        Err(CoreError::NotFound(message)) => {
            assert!(message.contains(&ghost_id.to_string()), "{message}")
        }
        other => panic!("expected NotFound, got {other:?}"),
    }

    let (kept, staged) = scoped(factory.create(), move |uow| {
        Box::pin(async move {
            let images = uow.images()?;
            Ok::<_, CoreError>((
                images.get_by_id(stored_id).await?,
                images.get_by_id(staged_id).await?,
            ))
        })
    })
    .await?;
    assert_eq!(kept.expect("stored image survives").blurhash, None);
    assert!(staged.is_none());
    Ok(())
}

pub async fn get_many_skips_missing_ids(
    factory: Arc<dyn UnitOfWorkFactory>,
) -> Result<()> {
    let dave = account("dave");
    let first = Image::new(dave.clone(), "https://cdn.test/1", None);
    let second = Image::new(dave, "https://cdn.test/2", None);
    let (first_id, second_id) = (first.image_id, second.image_id);
    store_image(&factory, first).await?;
    store_image(&factory, second).await?;

    let request = vec![second_id, ImageID::new(), first_id];
    let found = scoped(factory.create(), move |uow| {
        Box::pin(async move { uow.images()?.get_many(&request).await })
    })
    .await?;
    let order: Vec<ImageID> = found.iter().map(|image| image.image_id).collect();
    assert_eq!(order, vec![second_id, first_id]);

    let none = scoped(factory.create(), move |uow| {
        Box::pin(async move { uow.images()?.get_many(&[ImageID::new()]).await })
    })
    .await?;
    assert!(none.is_empty());
    Ok(())
}
