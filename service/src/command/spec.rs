use std::time::Duration;

use common::{DateTime, DateTimeOf, Money};
use secrecy::SecretBox;

use crate::{
    command::{
        self, AuthorizeUserSession, CreateBooking, CreateListing, CreateUser,
        CreateUserSession, UpgradeUserToHost,
    },
    domain::{
        listing,
        user::{self, Role},
        Listing, Stay, User,
    },
    infra::Memory,
    query, read, Command as _, Config, Service,
};

fn service() -> Service<Memory> {
    Service::new(
        Config::with_secret(b"test-secret", Duration::from_secs(3600)),
        Memory::new(),
    )
}

fn at<Of: ?Sized>(date: &str) -> DateTimeOf<Of> {
    DateTime::from_rfc3339(&format!("{date}T00:00:00Z"))
        .unwrap()
        .coerce()
}

fn password(raw: &str) -> SecretBox<user::Password> {
    SecretBox::new(Box::new(user::Password::new(raw).unwrap()))
}

async fn register(svc: &Service<Memory>, email: &str) -> User {
    svc.execute(CreateUser {
        email: user::Email::new(email).unwrap(),
        password: password("correct horse"),
        name: None,
    })
    .await
    .unwrap()
}

async fn host(svc: &Service<Memory>, email: &str) -> User {
    let user = register(svc, email).await;
    if user.role == Role::User {
        svc.execute(UpgradeUserToHost { user_id: user.id })
            .await
            .unwrap()
    } else {
        user
    }
}

fn listing_in(host_id: user::Id, city: &str, max_guests: u16) -> CreateListing {
    CreateListing {
        host_id,
        title: listing::Title::new("Cozy flat").unwrap(),
        description: listing::Description::new("Close to the river").unwrap(),
        kind: listing::Kind::new("Apartment").unwrap(),
        price: "100USD".parse::<Money>().unwrap(),
        address: listing::Address::new("1 Main street").unwrap(),
        city: listing::City::new(city).unwrap(),
        country: listing::Country::new("Congo").unwrap(),
        amenities: vec![listing::Amenity::new("WiFi").unwrap()],
        max_guests: listing::Guests::new(max_guests).unwrap(),
        bedrooms: 1,
        bathrooms: 1,
        photos: vec![
            listing::PhotoUrl::new("https://img.example.com/1.jpg").unwrap(),
            listing::PhotoUrl::new("https://img.example.com/2.jpg").unwrap(),
        ],
        availability: Stay::new(at("2024-01-01"), at("2025-01-01")).unwrap(),
    }
}

async fn publish(svc: &Service<Memory>, host_id: user::Id) -> Listing {
    svc.execute(listing_in(host_id, "Kinshasa", 4)).await.unwrap()
}

fn booking(
    user_id: user::Id,
    listing_id: listing::Id,
    start: &str,
    end: &str,
) -> CreateBooking {
    CreateBooking {
        user_id,
        listing_id,
        start: at(start),
        end: at(end),
    }
}

#[tokio::test]
async fn first_user_becomes_super_admin() {
    let svc = service();

    let first = register(&svc, "first@example.com").await;
    let second = register(&svc, "second@example.com").await;

    assert_eq!(first.role, Role::SuperAdmin);
    assert_eq!(second.role, Role::User);
}

#[tokio::test]
async fn rejects_occupied_email() {
    let svc = service();
    drop(register(&svc, "guest@example.com").await);

    let err = svc
        .execute(CreateUser {
            email: user::Email::new("GUEST@example.com").unwrap(),
            password: password("another one"),
            name: None,
        })
        .await
        .unwrap_err();

    assert!(matches!(
        err.as_ref(),
        command::create_user::ExecutionError::EmailOccupied(_),
    ));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_registrations_with_same_email() {
    use command::create_user::ExecutionError as E;

    let svc = service();
    drop(register(&svc, "admin@example.com").await);

    let tasks = (0..8)
        .map(|i| {
            let svc = svc.clone();
            tokio::spawn(async move {
                svc.execute(CreateUser {
                    email: user::Email::new("twin@example.com").unwrap(),
                    password: password(&format!("password {i}")),
                    name: None,
                })
                .await
            })
        })
        .collect::<Vec<_>>();
    let mut registered = 0;
    for task in tasks {
        match task.await.unwrap() {
            Ok(_) => registered += 1,
            Err(e) => assert!(matches!(e.as_ref(), E::EmailOccupied(_)), "{e}"),
        }
    }

    assert_eq!(registered, 1);
}

#[tokio::test]
async fn upgrades_to_host_only_once() {
    use command::upgrade_user_to_host::ExecutionError as E;

    let svc = service();
    drop(register(&svc, "admin@example.com").await);
    let user = register(&svc, "guest@example.com").await;

    let upgraded = svc
        .execute(UpgradeUserToHost { user_id: user.id })
        .await
        .unwrap();
    assert_eq!(upgraded.role, Role::Host);

    let err = svc
        .execute(UpgradeUserToHost { user_id: user.id })
        .await
        .unwrap_err();
    assert!(matches!(err.as_ref(), E::AlreadyElevated(Role::Host)));

    let err = svc
        .execute(UpgradeUserToHost {
            user_id: user::Id::new(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err.as_ref(), E::UserNotExists(_)));
}

#[tokio::test]
async fn session_reflects_current_role() {
    let svc = service();
    drop(register(&svc, "admin@example.com").await);
    let user = register(&svc, "guest@example.com").await;

    let session = svc
        .execute(CreateUserSession::ByCredentials {
            email: user::Email::new("guest@example.com").unwrap(),
            password: password("correct horse"),
        })
        .await
        .unwrap();
    assert_eq!(session.user.id, user.id);

    let authorized = svc
        .execute(AuthorizeUserSession {
            token: session.token.clone(),
        })
        .await
        .unwrap();
    assert_eq!(authorized.user_id, user.id);
    assert_eq!(authorized.role, Role::User);

    drop(
        svc.execute(UpgradeUserToHost { user_id: user.id })
            .await
            .unwrap(),
    );
    let authorized = svc
        .execute(AuthorizeUserSession {
            token: session.token,
        })
        .await
        .unwrap();
    assert_eq!(authorized.role, Role::Host);
}

#[tokio::test]
async fn rejects_wrong_credentials() {
    use command::create_user_session::ExecutionError as E;

    let svc = service();
    drop(register(&svc, "guest@example.com").await);

    let err = svc
        .execute(CreateUserSession::ByCredentials {
            email: user::Email::new("guest@example.com").unwrap(),
            password: password("wrong horse"),
        })
        .await
        .unwrap_err();
    assert!(matches!(err.as_ref(), E::WrongCredentials));

    let err = svc
        .execute(CreateUserSession::ByCredentials {
            email: user::Email::new("nobody@example.com").unwrap(),
            password: password("correct horse"),
        })
        .await
        .unwrap_err();
    assert!(matches!(err.as_ref(), E::WrongCredentials));
}

#[tokio::test]
async fn rejects_tampered_token() {
    use command::authorize_user_session::ExecutionError as E;

    let svc = service();
    let user = register(&svc, "guest@example.com").await;
    let session = svc
        .execute(CreateUserSession::ByUserId(user.id))
        .await
        .unwrap();

    let other = Service::new(
        Config::with_secret(b"other-secret", Duration::from_secs(3600)),
        svc.database().clone(),
    );
    let err = other
        .execute(AuthorizeUserSession {
            token: session.token,
        })
        .await
        .unwrap_err();
    assert!(matches!(err.as_ref(), E::JsonWebTokenDecodeError(_)));
}

#[tokio::test]
async fn only_hosts_publish_listings() {
    use command::create_listing::ExecutionError as E;

    let svc = service();
    let admin = register(&svc, "admin@example.com").await;
    let guest = register(&svc, "guest@example.com").await;

    let err = svc
        .execute(listing_in(guest.id, "Kinshasa", 2))
        .await
        .unwrap_err();
    assert!(matches!(err.as_ref(), E::NotHost(_)));

    let mut free = listing_in(admin.id, "Kinshasa", 2);
    free.price = "0USD".parse().unwrap();
    let err = svc.execute(free).await.unwrap_err();
    assert!(matches!(err.as_ref(), E::NonPositivePrice(_)));

    let mut lavish = listing_in(admin.id, "Kinshasa", 2);
    lavish.price = "1000000000000000000USD".parse().unwrap();
    let err = svc.execute(lavish).await.unwrap_err();
    assert!(matches!(err.as_ref(), E::PriceTooHigh(_)));

    let listing = svc.execute(listing_in(admin.id, "Kinshasa", 2)).await.unwrap();
    let photos = svc
        .execute(query::listing::Photos::by(listing.id))
        .await
        .unwrap();
    assert_eq!(
        photos.iter().map(|p| p.position).collect::<Vec<_>>(),
        [0, 1],
    );
    let availability = svc
        .execute(query::listing::Availability::by(listing.id))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(availability.period.start(), at("2024-01-01"));
}

#[tokio::test]
async fn charges_every_night() {
    let svc = service();
    let host = host(&svc, "host@example.com").await;
    let guest = register(&svc, "guest@example.com").await;
    let listing = publish(&svc, host.id).await;

    let booked = svc
        .execute(booking(guest.id, listing.id, "2024-07-01", "2024-07-04"))
        .await
        .unwrap();

    assert_eq!(booked.total_price, "300USD".parse::<Money>().unwrap());
    assert_eq!(booked.stay.nights(), 3);
}

#[tokio::test]
async fn host_cannot_book_own_listing() {
    use command::create_booking::ExecutionError as E;

    let svc = service();
    let host = host(&svc, "host@example.com").await;
    let listing = publish(&svc, host.id).await;

    for (start, end) in [("2024-07-01", "2024-07-04"), ("2024-01-10", "2024-01-09")]
    {
        let err = svc
            .execute(booking(host.id, listing.id, start, end))
            .await
            .unwrap_err();

        assert!(matches!(err.as_ref(), E::SelfBooking(_)), "{start}..{end}");
    }
}

#[tokio::test]
async fn rejects_empty_or_inverted_stay() {
    use command::create_booking::ExecutionError as E;

    let svc = service();
    let host = host(&svc, "host@example.com").await;
    let guest = register(&svc, "guest@example.com").await;
    let listing = publish(&svc, host.id).await;

    for (start, end) in [("2024-07-04", "2024-07-04"), ("2024-07-04", "2024-07-01")]
    {
        let err = svc
            .execute(booking(guest.id, listing.id, start, end))
            .await
            .unwrap_err();
        assert!(matches!(err.as_ref(), E::InvalidStay));
    }
}

#[tokio::test]
async fn rejects_unknown_listing() {
    use command::create_booking::ExecutionError as E;

    let svc = service();
    let guest = register(&svc, "guest@example.com").await;

    let err = svc
        .execute(booking(
            guest.id,
            listing::Id::new(),
            "2024-07-01",
            "2024-07-04",
        ))
        .await
        .unwrap_err();

    assert!(matches!(err.as_ref(), E::ListingNotExists(_)));
}

#[tokio::test]
async fn never_double_books() {
    use command::create_booking::ExecutionError as E;

    let svc = service();
    let host = host(&svc, "host@example.com").await;
    let alice = register(&svc, "alice@example.com").await;
    let bob = register(&svc, "bob@example.com").await;
    let listing = publish(&svc, host.id).await;

    drop(
        svc.execute(booking(alice.id, listing.id, "2024-07-01", "2024-07-10"))
            .await
            .unwrap(),
    );

    let err = svc
        .execute(booking(bob.id, listing.id, "2024-07-05", "2024-07-12"))
        .await
        .unwrap_err();
    assert!(matches!(err.as_ref(), E::DatesUnavailable(_)));

    // Checkout day is free for the next check-in.
    drop(
        svc.execute(booking(bob.id, listing.id, "2024-07-10", "2024-07-12"))
            .await
            .unwrap(),
    );
    drop(
        svc.execute(booking(bob.id, listing.id, "2024-06-28", "2024-07-01"))
            .await
            .unwrap(),
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_bookings_of_same_dates() {
    use command::create_booking::ExecutionError as E;

    let svc = service();
    let host = host(&svc, "host@example.com").await;
    let listing = publish(&svc, host.id).await;
    let mut guests = vec![];
    for i in 0..8 {
        guests.push(register(&svc, &format!("guest{i}@example.com")).await);
    }

    let listing_id = listing.id;
    let tasks = guests
        .into_iter()
        .map(|guest| {
            let svc = svc.clone();
            tokio::spawn(async move {
                svc.execute(booking(
                    guest.id,
                    listing_id,
                    "2024-07-01",
                    "2024-07-05",
                ))
                .await
            })
        })
        .collect::<Vec<_>>();
    let mut booked = 0;
    for task in tasks {
        match task.await.unwrap() {
            Ok(_) => booked += 1,
            Err(e) => assert!(matches!(e.as_ref(), E::DatesUnavailable(_))),
        }
    }

    assert_eq!(booked, 1);
}

#[tokio::test]
async fn search_honors_dates_and_guests() {
    let svc = service();
    let host = host(&svc, "host@example.com").await;
    let guest = register(&svc, "guest@example.com").await;
    let listing = svc
        .execute(listing_in(host.id, "Kinshasa", 4))
        .await
        .unwrap();
    drop(svc.execute(listing_in(host.id, "Lubumbashi", 4)).await.unwrap());
    drop(
        svc.execute(booking(guest.id, listing.id, "2024-07-01", "2024-07-10"))
            .await
            .unwrap(),
    );

    let search = |start: &str, end: &str, guests: i32| {
        read::listing::search::Filter::new(
            Some("kinshasa"),
            Some(at(start)),
            Some(at(end)),
            Some(guests),
        )
        .unwrap()
    };

    let found = svc
        .execute(query::listings::Search::by(search(
            "2024-07-05",
            "2024-07-08",
            2,
        )))
        .await
        .unwrap();
    assert!(found.is_empty());

    let found = svc
        .execute(query::listings::Search::by(search(
            "2024-07-10",
            "2024-07-12",
            2,
        )))
        .await
        .unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].listing.id, listing.id);
    assert_eq!(found[0].host.id, host.id);
    assert_eq!(found[0].cover.as_ref().map(|c| c.position), Some(0));

    let found = svc
        .execute(query::listings::Search::by(search(
            "2024-07-10",
            "2024-07-12",
            5,
        )))
        .await
        .unwrap();
    assert!(found.is_empty());
}

#[tokio::test]
async fn lists_hosted_and_recent() {
    let svc = service();
    let host = host(&svc, "host@example.com").await;
    let guest = register(&svc, "guest@example.com").await;
    let first = publish(&svc, host.id).await;
    let second = publish(&svc, host.id).await;
    drop(
        svc.execute(booking(guest.id, first.id, "2024-07-01", "2024-07-03"))
            .await
            .unwrap(),
    );

    let hosted = svc
        .execute(query::listings::Hosted::by(host.id))
        .await
        .unwrap();
    assert_eq!(hosted.len(), 2);
    let counts = hosted
        .iter()
        .map(|h| (h.listing.id, h.bookings_count))
        .collect::<Vec<_>>();
    assert!(counts.contains(&(first.id, 1)));
    assert!(counts.contains(&(second.id, 0)));
    assert!(hosted.iter().all(|h| h.photos.len() == 2));

    let recent = svc
        .execute(query::listings::Recent::by(
            read::listing::Recent::new(1).unwrap(),
        ))
        .await
        .unwrap();
    assert_eq!(recent.len(), 1);

    let none = svc
        .execute(query::listings::Hosted::by(guest.id))
        .await
        .unwrap();
    assert!(none.is_empty());
}

#[tokio::test]
async fn rejects_unstorable_total_price() {
    use command::create_booking::ExecutionError as E;

    let svc = service();
    let host = host(&svc, "host@example.com").await;
    let guest = register(&svc, "guest@example.com").await;
    let mut pricey = listing_in(host.id, "Kinshasa", 2);
    pricey.price = "100000000000000000USD".parse().unwrap();
    let listing = svc.execute(pricey).await.unwrap();

    let err = svc
        .execute(booking(guest.id, listing.id, "2024-07-01", "2024-07-21"))
        .await
        .unwrap_err();

    assert!(matches!(err.as_ref(), E::PriceOverflow(_)));
}

#[tokio::test]
async fn search_matches_any_text_field_newest_first() {
    let svc = service();
    let host = host(&svc, "host@example.com").await;
    let river = publish(&svc, host.id).await;
    tokio::time::sleep(Duration::from_millis(10)).await;
    let mut seaside = listing_in(host.id, "Lisbon", 2);
    seaside.country = listing::Country::new("Portugal").unwrap();
    seaside.description = listing::Description::new("Ocean view").unwrap();
    let seaside = svc.execute(seaside).await.unwrap();

    let search = |destination: Option<&str>| {
        query::listings::Search::by(
            read::listing::search::Filter::new(destination, None, None, None)
                .unwrap(),
        )
    };
    let ids = |items: Vec<read::listing::search::Item>| {
        items.into_iter().map(|i| i.listing.id).collect::<Vec<_>>()
    };

    let everything = svc.execute(search(None)).await.unwrap();
    assert_eq!(ids(everything), [seaside.id, river.id]);

    let by_country = svc.execute(search(Some("portugal"))).await.unwrap();
    assert_eq!(ids(by_country), [seaside.id]);

    let by_description = svc.execute(search(Some("RIVER"))).await.unwrap();
    assert_eq!(ids(by_description), [river.id]);

    let huge_party = svc
        .execute(query::listings::Search::by(
            read::listing::search::Filter::new(None, None, None, Some(70_000))
                .unwrap(),
        ))
        .await
        .unwrap();
    assert!(huge_party.is_empty());

    let recent = svc
        .execute(query::listings::Recent::by(
            read::listing::Recent::new(1).unwrap(),
        ))
        .await
        .unwrap();
    assert_eq!(ids(recent), [seaside.id]);
}
