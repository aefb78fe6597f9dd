//! [`Listing`]-related [`Database`] implementations.

use std::collections::HashMap;

use common::{
    operations::{By, Insert, Lock, Select},
    Money,
};
use itertools::Itertools as _;
use postgres_types::ToSql;
use tokio_postgres::Row;
use tracerr::Traced;

use crate::{
    domain::{listing, user, Listing, Stay, User},
    infra::{
        database::{
            self,
            postgres::{Connection, LikePattern},
            Postgres,
        },
        Database,
    },
    read,
};

/// Decodes a [`listing::Photo`] out of the provided [`Row`].
fn photo_from_row(row: &Row) -> listing::Photo {
    listing::Photo {
        listing_id: row.get("listing_id"),
        url: row.get("url"),
        position: u16::try_from(row.get::<_, i32>("position"))
            .expect("`position` overflow"),
    }
}

/// Loads [`read::listing::search::Item`]s of the [`Listing`]s with the
/// provided `ids`, preserving their order.
async fn search_items<C: Connection>(
    db: &Postgres<C>,
    ids: Vec<listing::Id>,
) -> Result<Vec<read::listing::search::Item>, Traced<database::Error>> {
    let mut listings = db
        .execute(Select(By::<HashMap<listing::Id, Listing>, _>::new(
            ids.as_slice(),
        )))
        .await
        .map_err(tracerr::wrap!())?;

    let host_ids = listings.values().map(|l| l.host_id).unique().collect_vec();
    let hosts = db
        .execute(Select(By::<HashMap<user::Id, User>, _>::new(host_ids)))
        .await
        .map_err(tracerr::wrap!())?;

    const SQL: &str = "\
        SELECT DISTINCT ON (listing_id) \
               listing_id, url, position \
        FROM listing_photos \
        WHERE listing_id = ANY($1::UUID[]) \
        ORDER BY listing_id, position";
    let mut covers = db
        .query(SQL, &[&ids])
        .await
        .map_err(tracerr::wrap!())?
        .iter()
        .map(|row| {
            let photo = photo_from_row(row);
            (photo.listing_id, photo)
        })
        .collect::<HashMap<_, _>>();

    Ok(ids
        .into_iter()
        .filter_map(|id| {
            let listing = listings.remove(&id)?;
            let host = hosts.get(&listing.host_id)?.into();
            Some(read::listing::search::Item {
                cover: covers.remove(&id),
                host,
                listing,
            })
        })
        .collect())
}

impl<C, IDs> Database<Select<By<HashMap<listing::Id, Listing>, IDs>>>
    for Postgres<C>
where
    C: Connection,
    IDs: AsRef<[listing::Id]>,
{
    type Ok = HashMap<listing::Id, Listing>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<HashMap<listing::Id, Listing>, IDs>>,
    ) -> Result<Self::Ok, Self::Err> {
        let ids = by.into_inner();
        // Avoid subtle change for SQL.
        let ids: &[listing::Id] = ids.as_ref();
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let limit = i32::try_from(ids.len()).unwrap_or(i32::MAX);

        const SQL: &str = "\
            SELECT id, host_id, \
                   title, description, kind, \
                   price, currency, \
                   address, city, country, \
                   amenities, max_guests, bedrooms, bathrooms, \
                   created_at \
            FROM listings \
            WHERE id IN (SELECT unnest($1::UUID[]) LIMIT $2::INT4) \
            LIMIT $2::INT4";
        Ok(self
            .query(SQL, &[&ids, &limit])
            .await
            .map_err(tracerr::wrap!())?
            .into_iter()
            .map(|row| {
                let id = row.get("id");
                (
                    id,
                    Listing {
                        id,
                        host_id: row.get("host_id"),
                        title: row.get("title"),
                        description: row.get("description"),
                        kind: row.get("kind"),
                        price: Money {
                            amount: row.get("price"),
                            currency: row.get("currency"),
                        },
                        address: row.get("address"),
                        city: row.get("city"),
                        country: row.get("country"),
                        amenities: row.get("amenities"),
                        max_guests: listing::Guests::try_from(
                            row.get::<_, i32>("max_guests"),
                        )
                        .expect("`max_guests` out of range"),
                        bedrooms: u16::try_from(row.get::<_, i32>("bedrooms"))
                            .expect("`bedrooms` overflow"),
                        bathrooms: u16::try_from(
                            row.get::<_, i32>("bathrooms"),
                        )
                        .expect("`bathrooms` overflow"),
                        created_at: row.get("created_at"),
                    },
                )
            })
            .collect())
    }
}

impl<C> Database<Select<By<Option<Listing>, listing::Id>>> for Postgres<C>
where
    C: Connection,
    Self: Database<
        Select<By<HashMap<listing::Id, Listing>, [listing::Id; 1]>>,
        Ok = HashMap<listing::Id, Listing>,
        Err = Traced<database::Error>,
    >,
{
    type Ok = Option<Listing>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Listing>, listing::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        Ok(self
            .execute(Select(By::new([id])))
            .await
            .map_err(tracerr::wrap!())?
            .remove(&id))
    }
}

impl<C> Database<Insert<Listing>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(listing): Insert<Listing>,
    ) -> Result<Self::Ok, Self::Err> {
        let Listing {
            id,
            host_id,
            title,
            description,
            kind,
            price: Money { amount, currency },
            address,
            city,
            country,
            amenities,
            max_guests,
            bedrooms,
            bathrooms,
            created_at,
        } = listing;
        let max_guests = i32::from(u16::from(max_guests));
        let bedrooms = i32::from(bedrooms);
        let bathrooms = i32::from(bathrooms);

        const SQL: &str = "\
            INSERT INTO listings (\
                id, host_id, \
                title, description, kind, \
                price, currency, \
                address, city, country, \
                amenities, max_guests, bedrooms, bathrooms, \
                created_at\
            ) \
            VALUES (\
                $1::UUID, $2::UUID, \
                $3::VARCHAR, $4::TEXT, $5::VARCHAR, \
                $6::NUMERIC, $7::INT2, \
                $8::VARCHAR, $9::VARCHAR, $10::VARCHAR, \
                $11::VARCHAR[], $12::INT4, $13::INT4, $14::INT4, \
                $15::TIMESTAMPTZ\
            )";
        self.exec(
            SQL,
            &[
                &id,
                &host_id,
                &title,
                &description,
                &kind,
                &amount,
                &currency,
                &address,
                &city,
                &country,
                &amenities,
                &max_guests,
                &bedrooms,
                &bathrooms,
                &created_at,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}

impl<C> Database<Insert<listing::Photo>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(photo): Insert<listing::Photo>,
    ) -> Result<Self::Ok, Self::Err> {
        let listing::Photo {
            listing_id,
            url,
            position,
        } = photo;
        let position = i32::from(position);

        const SQL: &str = "\
            INSERT INTO listing_photos (listing_id, url, position) \
            VALUES ($1::UUID, $2::VARCHAR, $3::INT4)";
        self.exec(SQL, &[&listing_id, &url, &position])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}

impl<C> Database<Insert<listing::Availability>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(availability): Insert<listing::Availability>,
    ) -> Result<Self::Ok, Self::Err> {
        let listing::Availability { listing_id, period } = availability;
        let (start, end) = (period.start(), period.end());

        const SQL: &str = "\
            INSERT INTO listing_availabilities (\
                listing_id, start_date, end_date\
            ) \
            VALUES ($1::UUID, $2::TIMESTAMPTZ, $3::TIMESTAMPTZ) \
            ON CONFLICT (listing_id) DO UPDATE \
            SET start_date = EXCLUDED.start_date, \
                end_date = EXCLUDED.end_date";
        self.exec(SQL, &[&listing_id, &start, &end])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}

impl<C> Database<Lock<By<Listing, listing::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Lock(by): Lock<By<Listing, listing::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let id: listing::Id = by.into_inner();

        const SQL: &str = "\
            INSERT INTO listings_lock \
            VALUES ($1::UUID) \
            ON CONFLICT (id) DO UPDATE SET id = EXCLUDED.id";
        self.exec(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}

impl<C> Database<Select<By<Vec<listing::Photo>, listing::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<listing::Photo>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<listing::Photo>, listing::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id: listing::Id = by.into_inner();

        const SQL: &str = "\
            SELECT listing_id, url, position \
            FROM listing_photos \
            WHERE listing_id = $1::UUID \
            ORDER BY position";
        Ok(self
            .query(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())?
            .iter()
            .map(photo_from_row)
            .collect())
    }
}

impl<C> Database<Select<By<Option<listing::Availability>, listing::Id>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<listing::Availability>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<listing::Availability>, listing::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let listing_id: listing::Id = by.into_inner();

        const SQL: &str = "\
            SELECT start_date, end_date \
            FROM listing_availabilities \
            WHERE listing_id = $1::UUID";
        Ok(self
            .query_opt(SQL, &[&listing_id])
            .await
            .map_err(tracerr::wrap!())?
            .and_then(|row| {
                Stay::new(row.get("start_date"), row.get("end_date"))
            })
            .map(|period| listing::Availability { listing_id, period }))
    }
}

impl<C>
    Database<
        Select<
            By<Vec<read::listing::search::Item>, read::listing::search::Filter>,
        >,
    > for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<read::listing::search::Item>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<
            By<Vec<read::listing::search::Item>, read::listing::search::Filter>,
        >,
    ) -> Result<Self::Ok, Self::Err> {
        let filter = by.into_inner();

        let pattern = filter
            .destination()
            .map(|d| LikePattern::containing(d.as_ref()));
        let guests = filter.guests().map(i64::from);
        let stay = filter.stay().map(|s| (s.start(), s.end()));

        let mut ps: Vec<&(dyn ToSql + Sync)> = vec![];

        let pattern_idx = pattern.as_ref().map(|p| {
            ps.push(p);
            ps.len()
        });
        let guests_idx = guests.as_ref().map(|g| {
            ps.push(g);
            ps.len()
        });
        let stay_idx = stay.as_ref().map(|(start, end)| {
            ps.push(start);
            ps.push(end);
            (ps.len() - 1, ps.len())
        });

        let sql = format!(
            "SELECT l.id \
             FROM listings AS l \
             WHERE TRUE \
                   {destination} \
                   {guests} \
                   {stay} \
             ORDER BY l.created_at DESC, l.id",
            destination = pattern_idx.into_iter().format_with("", |idx, f| {
                f(&format_args!(
                    "AND (l.city ILIKE ${idx}::VARCHAR \
                          OR l.country ILIKE ${idx}::VARCHAR \
                          OR l.title ILIKE ${idx}::VARCHAR \
                          OR l.description ILIKE ${idx}::VARCHAR)"
                ))
            }),
            guests = guests_idx.into_iter().format_with("", |idx, f| {
                f(&format_args!("AND l.max_guests >= ${idx}::INT8"))
            }),
            stay = stay_idx.into_iter().format_with("", |(s, e), f| {
                f(&format_args!(
                    "AND NOT EXISTS (\
                         SELECT 1 \
                         FROM bookings AS b \
                         WHERE b.listing_id = l.id \
                           AND b.start_date < ${e}::TIMESTAMPTZ \
                           AND b.end_date > ${s}::TIMESTAMPTZ\
                     )"
                ))
            }),
        );
        let ids = self
            .query(&sql, ps.as_slice())
            .await
            .map_err(tracerr::wrap!())?
            .into_iter()
            .map(|row| row.get("id"))
            .collect();

        search_items(self, ids).await.map_err(tracerr::wrap!())
    }
}

impl<C>
    Database<Select<By<Vec<read::listing::search::Item>, read::listing::Recent>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<read::listing::search::Item>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<
            By<Vec<read::listing::search::Item>, read::listing::Recent>,
        >,
    ) -> Result<Self::Ok, Self::Err> {
        let limit = i32::from(by.into_inner().limit());

        const SQL: &str = "\
            SELECT id \
            FROM listings \
            ORDER BY created_at DESC, id \
            LIMIT $1::INT4";
        let ids = self
            .query(SQL, &[&limit])
            .await
            .map_err(tracerr::wrap!())?
            .into_iter()
            .map(|row| row.get("id"))
            .collect();

        search_items(self, ids).await.map_err(tracerr::wrap!())
    }
}

impl<C> Database<Select<By<Vec<read::listing::hosted::Item>, user::Id>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<read::listing::hosted::Item>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<read::listing::hosted::Item>, user::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let host_id: user::Id = by.into_inner();

        const LISTINGS_SQL: &str = "\
            SELECT l.id, \
                   (SELECT COUNT(*) \
                    FROM bookings AS b \
                    WHERE b.listing_id = l.id)::INT8 AS bookings_count \
            FROM listings AS l \
            WHERE l.host_id = $1::UUID \
            ORDER BY l.created_at DESC, l.id";
        let (ids, counts): (Vec<listing::Id>, Vec<i64>) = self
            .query(LISTINGS_SQL, &[&host_id])
            .await
            .map_err(tracerr::wrap!())?
            .into_iter()
            .map(|row| (row.get::<_, listing::Id>("id"), row.get::<_, i64>("bookings_count")))
            .unzip();

        let mut listings = self
            .execute(Select(By::<HashMap<listing::Id, Listing>, _>::new(
                ids.as_slice(),
            )))
            .await
            .map_err(tracerr::wrap!())?;

        const PHOTOS_SQL: &str = "\
            SELECT listing_id, url, position \
            FROM listing_photos \
            WHERE listing_id = ANY($1::UUID[]) \
            ORDER BY listing_id, position";
        let mut photos = self
            .query(PHOTOS_SQL, &[&ids])
            .await
            .map_err(tracerr::wrap!())?
            .iter()
            .map(photo_from_row)
            .into_group_map_by(|p| p.listing_id);

        Ok(ids
            .into_iter()
            .zip(counts)
            .filter_map(|(id, count)| {
                Some(read::listing::hosted::Item {
                    listing: listings.remove(&id)?,
                    photos: photos.remove(&id).unwrap_or_default(),
                    bookings_count: u64::try_from(count).unwrap_or_default(),
                })
            })
            .collect())
    }
}
