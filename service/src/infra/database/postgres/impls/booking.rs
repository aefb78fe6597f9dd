//! [`Booking`]-related [`Database`] implementations.

use common::{
    operations::{By, Insert, Select},
    Money,
};
use tracerr::Traced;

use crate::{
    domain::Booking,
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
    read,
};

impl<C> Database<Insert<Booking>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    /// Inserts a new [`Booking`], failing with the `bookings_no_overlap`
    /// exclusion violation if it overlaps an existing one.
    async fn execute(
        &self,
        Insert(booking): Insert<Booking>,
    ) -> Result<Self::Ok, Self::Err> {
        let Booking {
            id,
            listing_id,
            user_id,
            stay,
            total_price: Money { amount, currency },
            created_at,
        } = booking;
        let (start, end) = (stay.start(), stay.end());

        const SQL: &str = "\
            INSERT INTO bookings (\
                id, listing_id, user_id, \
                start_date, end_date, \
                total_price, currency, \
                created_at\
            ) \
            VALUES (\
                $1::UUID, $2::UUID, $3::UUID, \
                $4::TIMESTAMPTZ, $5::TIMESTAMPTZ, \
                $6::NUMERIC, $7::INT2, \
                $8::TIMESTAMPTZ\
            )";
        self.exec(
            SQL,
            &[
                &id,
                &listing_id,
                &user_id,
                &start,
                &end,
                &amount,
                &currency,
                &created_at,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}

impl<C> Database<Select<By<read::booking::IsTaken, read::booking::Slot>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = read::booking::IsTaken;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<read::booking::IsTaken, read::booking::Slot>>,
    ) -> Result<Self::Ok, Self::Err> {
        let read::booking::Slot { listing_id, stay } = by.into_inner();
        let (start, end) = (stay.start(), stay.end());

        const SQL: &str = "\
            SELECT EXISTS (\
                SELECT 1 \
                FROM bookings \
                WHERE listing_id = $1::UUID \
                  AND start_date < $3::TIMESTAMPTZ \
                  AND end_date > $2::TIMESTAMPTZ\
            ) AS taken";
        let taken = self
            .query_opt(SQL, &[&listing_id, &start, &end])
            .await
            .map_err(tracerr::wrap!())?
            .is_some_and(|row| row.get("taken"));
        Ok(read::booking::IsTaken(taken))
    }
}
