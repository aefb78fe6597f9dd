//! GraphQL [`Mutation`]s definitions.

use common::{DateTime, Money};
use juniper::graphql_object;
use service::{
    command,
    domain::{listing, Stay},
    Command as _,
};

use crate::{api, define_error, AsError, Context, Error};

/// Root of all GraphQL mutations.
#[derive(Clone, Copy, Debug)]
pub struct Mutation;

impl Mutation {
    /// Name of the [`tracing::Span`] for the mutations.
    const SPAN_NAME: &'static str = "GraphQL mutation";

    /// Creates a new `Session` for the provided [`command::CreateUserSession`]
    /// and makes it the current one of the [`Context`].
    async fn sign_in(
        cmd: command::CreateUserSession,
        ctx: &Context,
    ) -> Result<api::user::session::CreateResult, Error> {
        let output = ctx
            .service()
            .execute(cmd)
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())?;

        ctx.set_current_session(api::user::session::CreateResult::session(
            &output,
        ))
        .await;

        Ok(output.into())
    }
}

#[graphql_object(context = Context)]
impl Mutation {
    /// Registers a new `User` and signs it in.
    ///
    /// The very first registered `User` becomes a `SUPER_ADMIN`.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `EMAIL_OCCUPIED` - provided `UserEmail` is used by another `User`.
    #[tracing::instrument(
        skip_all,
        fields(
            email = %email,
            gql.name = "createUser",
            name = ?name.as_ref().map(ToString::to_string),
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn create_user(
        email: api::user::Email,
        password: api::user::Password,
        name: Option<api::user::Name>,
        ctx: &Context,
    ) -> Result<api::user::session::CreateResult, Error> {
        let user = ctx
            .service()
            .execute(command::CreateUser {
                email: email.into(),
                password: secrecy::SecretBox::init_with(move || {
                    password.into()
                }),
                name: name.map(Into::into),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())?;

        Self::sign_in(command::CreateUserSession::ByUserId(user.id), ctx).await
    }

    /// Creates a new `Session` with the provided credentials.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `WRONG_CREDENTIALS` - provided credentials does not match any `User`.
    #[tracing::instrument(
        skip_all,
        fields(
            email = %email,
            gql.name = "createUserSession",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn create_user_session(
        email: api::user::Email,
        password: api::user::Password,
        ctx: &Context,
    ) -> Result<api::user::session::CreateResult, Error> {
        Self::sign_in(
            command::CreateUserSession::ByCredentials {
                email: email.into(),
                password: secrecy::SecretBox::init_with(move || {
                    password.into()
                }),
            },
            ctx,
        )
        .await
    }

    /// Upgrades the authenticated `User` to a host, able to publish
    /// `Listing`s.
    ///
    /// Returns a new `Session` reflecting the upgraded role.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `AUTHORIZATION_REQUIRED` - the request is not authenticated;
    /// - `ALREADY_ELEVATED` - the `User` is a host or an administrator
    ///                        already.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "becomeHost",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn become_host(
        ctx: &Context,
    ) -> Result<api::user::session::CreateResult, Error> {
        let my_id = ctx.current_session().await?.user_id;

        let user = ctx
            .service()
            .execute(command::UpgradeUserToHost {
                user_id: my_id.into(),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())?;

        Self::sign_in(command::CreateUserSession::ByUserId(user.id), ctx).await
    }

    /// Publishes a new `Listing` hosted by the authenticated `User`.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `AUTHORIZATION_REQUIRED` - the request is not authenticated;
    /// - `NOT_HOST` - the authenticated `User` is not a host;
    /// - `INVALID_LISTING` - provided capacity or availability is invalid;
    /// - `INVALID_PRICE` - provided price is not positive.
    #[tracing::instrument(
        skip_all,
        fields(
            available_from = ?available_from,
            available_to = ?available_to,
            city = %city,
            country = %country,
            gql.name = "createListing",
            max_guests = %max_guests,
            otel.name = Self::SPAN_NAME,
            photos = photos.len(),
            price = %price,
            title = %title,
        ),
    )]
    #[expect(clippy::too_many_arguments, reason = "still readable")]
    pub async fn create_listing(
        title: api::listing::Title,
        description: api::listing::Description,
        kind: api::listing::Kind,
        price: Money,
        address: api::listing::Address,
        city: api::listing::City,
        country: api::listing::Country,
        amenities: Vec<api::listing::Amenity>,
        max_guests: i32,
        bedrooms: i32,
        bathrooms: i32,
        photos: Vec<api::listing::PhotoUrl>,
        available_from: DateTime,
        available_to: DateTime,
        ctx: &Context,
    ) -> Result<api::Listing, Error> {
        let my_id = ctx.current_session().await?.user_id;

        let max_guests = listing::Guests::try_from(max_guests)
            .map_err(|_| ListingInputError::Guests.into())
            .map_err(ctx.error())?;
        let [bedrooms, bathrooms] = [bedrooms, bathrooms].map(|rooms| {
            listing::Rooms::try_from(rooms)
                .map_err(|_| Error::from(ListingInputError::Rooms))
        });
        let (bedrooms, bathrooms) = (
            bedrooms.map_err(ctx.error())?,
            bathrooms.map_err(ctx.error())?,
        );
        let availability =
            Stay::new(available_from.coerce(), available_to.coerce())
                .ok_or_else(|| ListingInputError::Availability.into())
                .map_err(ctx.error())?;

        ctx.service()
            .execute(command::CreateListing {
                host_id: my_id.into(),
                title: title.into(),
                description: description.into(),
                kind: kind.into(),
                price,
                address: address.into(),
                city: city.into(),
                country: country.into(),
                amenities: amenities.into_iter().map(Into::into).collect(),
                max_guests,
                bedrooms,
                bathrooms,
                photos: photos.into_iter().map(Into::into).collect(),
                availability,
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Books the `Listing` for the stay between the provided dates.
    ///
    /// The stay is half-open: the `endDate` night is not booked, so another
    /// `Booking` may start right at it.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `AUTHORIZATION_REQUIRED` - the request is not authenticated;
    /// - `LISTING_NOT_EXISTS` - the `Listing` does not exist;
    /// - `SELF_BOOKING` - the authenticated `User` hosts the `Listing`;
    /// - `INVALID_STAY` - `endDate` is not after `startDate`;
    /// - `DATES_UNAVAILABLE` - the `Listing` is booked for these dates
    ///                         already.
    #[tracing::instrument(
        skip_all,
        fields(
            end_date = ?end_date,
            gql.name = "createBooking",
            listing_id = %listing_id,
            otel.name = Self::SPAN_NAME,
            start_date = ?start_date,
        ),
    )]
    pub async fn create_booking(
        listing_id: api::listing::Id,
        start_date: DateTime,
        end_date: DateTime,
        ctx: &Context,
    ) -> Result<api::Booking, Error> {
        let my_id = ctx.current_session().await?.user_id;

        ctx.service()
            .execute(command::CreateBooking {
                user_id: my_id.into(),
                listing_id: listing_id.into(),
                start: start_date.coerce(),
                end: end_date.coerce(),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }
}

define_error! {
    enum ListingInputError {
        #[code = "INVALID_LISTING"]
        #[status = BAD_REQUEST]
        #[message = "`maxGuests` must be a positive integer"]
        Guests,

        #[code = "INVALID_LISTING"]
        #[status = BAD_REQUEST]
        #[message = "`bedrooms` and `bathrooms` must be non-negative"]
        Rooms,

        #[code = "INVALID_LISTING"]
        #[status = BAD_REQUEST]
        #[message = "`availableTo` must be after `availableFrom`"]
        Availability,
    }
}

impl AsError for command::create_user::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "EMAIL_OCCUPIED"]
                #[status = CONFLICT]
                #[message = "Provided email is used by another `User`"]
                EmailOccupied,
            }
        }

        match self {
            Self::Db(e) => e.try_as_error(),
            Self::EmailOccupied(_) => Some(Error::EmailOccupied.into()),
            Self::PasswordHashing(_) => None,
        }
    }
}

impl AsError for command::create_user_session::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "WRONG_CREDENTIALS"]
                #[status = UNAUTHORIZED]
                #[message = "Wrong email or password"]
                WrongCredentials,
            }
        }

        match self {
            Self::Db(e) => e.try_as_error(),
            Self::WrongCredentials => Some(Error::WrongCredentials.into()),
            Self::JsonWebTokenEncodeError(_) | Self::UserNotExists(_) => None,
        }
    }
}

impl AsError for command::upgrade_user_to_host::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "ALREADY_ELEVATED"]
                #[status = BAD_REQUEST]
                #[message = "`User` is a host or an administrator already"]
                AlreadyElevated,
            }
        }

        Some(match self {
            Self::Db(e) => return e.try_as_error(),
            Self::AlreadyElevated(_) => Error::AlreadyElevated.into(),
            Self::UserNotExists(_) => api::query::UserError::NotExists.into(),
        })
    }
}

impl AsError for command::create_listing::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "NOT_HOST"]
                #[status = FORBIDDEN]
                #[message = "Authenticated `User` must be a host"]
                NotHost,

                #[code = "INVALID_PRICE"]
                #[status = BAD_REQUEST]
                #[message = "`price` must be positive"]
                NonPositivePrice,

                #[code = "INVALID_PRICE"]
                #[status = BAD_REQUEST]
                #[message = "`price` is too high"]
                PriceTooHigh,

                #[code = "INVALID_LISTING"]
                #[status = BAD_REQUEST]
                #[message = "Too many photos provided"]
                TooManyPhotos,
            }
        }

        Some(match self {
            Self::Db(e) => return e.try_as_error(),
            Self::NotHost(_) => Error::NotHost.into(),
            Self::NonPositivePrice(_) => Error::NonPositivePrice.into(),
            Self::PriceTooHigh(_) => Error::PriceTooHigh.into(),
            Self::TooManyPhotos => Error::TooManyPhotos.into(),
            Self::UserNotExists(_) => api::query::UserError::NotExists.into(),
        })
    }
}

impl AsError for command::create_booking::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "SELF_BOOKING"]
                #[status = FORBIDDEN]
                #[message = "Host cannot book its own `Listing`"]
                SelfBooking,

                #[code = "INVALID_STAY"]
                #[status = BAD_REQUEST]
                #[message = "`endDate` must be after `startDate`"]
                InvalidStay,

                #[code = "DATES_UNAVAILABLE"]
                #[status = CONFLICT]
                #[message = "`Listing` is already booked for these dates"]
                DatesUnavailable,
            }
        }

        Some(match self {
            Self::Db(e) => return e.try_as_error(),
            Self::ListingNotExists(_) => {
                api::query::ListingError::NotExists.into()
            }
            Self::SelfBooking(_) => Error::SelfBooking.into(),
            Self::InvalidStay => Error::InvalidStay.into(),
            Self::DatesUnavailable(_) => Error::DatesUnavailable.into(),
            Self::PriceOverflow(_) => return None,
        })
    }
}

#[cfg(test)]
mod spec {
    use service::{
        command::{create_booking::ExecutionError, create_listing},
        domain::listing,
    };

    use crate::AsError as _;

    #[test]
    fn maps_booking_errors_to_statuses() {
        let id = listing::Id::new();
        for (err, code, status) in [
            (
                ExecutionError::ListingNotExists(id),
                "LISTING_NOT_EXISTS",
                http::StatusCode::NOT_FOUND,
            ),
            (
                ExecutionError::SelfBooking(id),
                "SELF_BOOKING",
                http::StatusCode::FORBIDDEN,
            ),
            (
                ExecutionError::InvalidStay,
                "INVALID_STAY",
                http::StatusCode::BAD_REQUEST,
            ),
            (
                ExecutionError::DatesUnavailable(id),
                "DATES_UNAVAILABLE",
                http::StatusCode::CONFLICT,
            ),
        ] {
            let err = err.as_error();

            assert_eq!(err.code, code);
            assert_eq!(err.status_code, status);
        }
    }

    #[test]
    fn hides_price_overflow() {
        let err = ExecutionError::PriceOverflow("100USD".parse().unwrap())
            .as_error();

        assert_eq!(err.code, "INTERNAL_SERVER_ERROR");
    }

    #[test]
    fn rejects_unstorable_price_as_bad_request() {
        let err = create_listing::ExecutionError::PriceTooHigh(
            "1000000000000000000USD".parse().unwrap(),
        )
        .as_error();

        assert_eq!(err.code, "INVALID_PRICE");
        assert_eq!(err.status_code, http::StatusCode::BAD_REQUEST);
    }
}
