use datarepo::prelude::*;

use crate::common::{Booking, Profile, User, seed, setup_db};

fn find_user(repo: &DataRepo<datarepo::RusqliteConnector>, id: i64) -> User {
    repo.select::<User>()
        .r#where(Filter::new().column("user_id", eq(id)))
        .first()
        .unwrap()
        .expect("user exists")
}

#[test]
fn update_changes_fields() {
    let (_dir, repo) = setup_db();
    let (ana, _, _) = seed(&repo);

    let mut user = find_user(&repo, ana);
    user.email = "ana@bookings.example".into();
    user.role = "dj".into();
    assert!(repo.update(&user));

    let stored = find_user(&repo, ana);
    assert_eq!(stored.email, "ana@bookings.example");
    assert_eq!(stored.role, "dj");
    assert_eq!(stored.username, "dj_ana");
}

#[test]
fn update_touches_only_the_identified_row() {
    let (_dir, repo) = setup_db();
    let (ana, bo, event) = seed(&repo);

    let mut first = Booking::new(event, ana, "pending");
    let mut second = Booking::new(event, bo, "pending");
    assert!(repo.insert(&mut first));
    assert!(repo.insert(&mut second));

    first.status = "confirmed".into();
    assert!(repo.update(&first));

    let pending = repo
        .select::<Booking>()
        .r#where(Filter::new().column("status", eq("pending")))
        .all()
        .unwrap()
        .unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].booking_id, second.booking_id);
}

#[test]
fn unset_fields_are_left_alone() {
    let (_dir, repo) = setup_db();
    let (ana, _, _) = seed(&repo);

    let mut profile = Profile {
        user_id: Some(ana),
        bio: Some("Resident DJ".into()),
        profile_picture: Some("ana.png".into()),
        ..Default::default()
    };
    assert!(repo.insert(&mut profile));

    let partial = Profile {
        profile_id: profile.profile_id,
        bio: Some("Touring DJ".into()),
        ..Default::default()
    };
    assert!(repo.update(&partial));

    let stored = repo.select::<Profile>().first().unwrap().unwrap();
    assert_eq!(stored.bio.as_deref(), Some("Touring DJ"));
    assert_eq!(stored.profile_picture.as_deref(), Some("ana.png"));
    assert_eq!(stored.user_id, Some(ana));
}

#[test]
fn update_without_id_returns_false() {
    let (_dir, repo) = setup_db();
    seed(&repo);

    let mut user = User::new("ghost", "ghost@example.com");
    user.role = "admin".into();
    assert!(!repo.update(&user));
    assert_eq!(repo.select::<User>().count().unwrap(), Some(2));
}

#[test]
fn update_violating_a_constraint_returns_false() {
    let (_dir, repo) = setup_db();
    let (_, bo, _) = seed(&repo);

    let mut user = find_user(&repo, bo);
    user.username = "dj_ana".into();
    assert!(!repo.update(&user));
    assert_eq!(find_user(&repo, bo).username, "bo");
}
