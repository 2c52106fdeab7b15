use diesel::prelude::*;

/// A 1..=5 score a buyer left for a seller on one listing.
#[derive(Debug, Queryable, Selectable, Identifiable, Clone)]
#[diesel(table_name = crate::schema::user_ratings)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Rating {
    pub id: i32,
    /// The rated seller
    pub user_id: i32,
    pub rater_id: i32,
    pub listing_id: i32,
    pub rating: i32,
    pub comment: Option<String>,
    pub created_at: jiff_diesel::Timestamp,
}

#[derive(Debug, Insertable, Clone)]
#[diesel(table_name = crate::schema::user_ratings)]
pub struct NewRating {
    pub user_id: i32,
    pub rater_id: i32,
    pub listing_id: i32,
    pub rating: i32,
    pub comment: Option<String>,
}

/// Aggregate over every rating a user has received.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RatingSummary {
    /// Mean score, exactly 0 when there are no ratings
    pub average_rating: f64,
    pub rating_count: i64,
}

impl RatingSummary {
    pub fn from_scores<I: IntoIterator<Item = i32>>(scores: I) -> Self {
        let (sum, count) = scores
            .into_iter()
            .fold((0i64, 0i64), |(sum, count), score| (sum + score as i64, count + 1));

        if count == 0 {
            return Self::default();
        }

        Self {
            average_rating: sum as f64 / count as f64,
            rating_count: count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_empty_summary_is_zero() {
        let summary = RatingSummary::from_scores(Vec::new());
        assert_eq!(summary.average_rating, 0.0);
        assert_eq!(summary.rating_count, 0);
    }

    #[test]
    fn test_summary_mean() {
        let summary = RatingSummary::from_scores([5, 4, 3]);
        assert_eq!(summary.rating_count, 3);
        assert!((summary.average_rating - 4.0).abs() < f64::EPSILON);
    }

    proptest! {
        #[test]
        fn prop_average_stays_within_rating_bounds(scores in proptest::collection::vec(1i32..=5, 1..50)) {
            let summary = RatingSummary::from_scores(scores.clone());
            prop_assert_eq!(summary.rating_count, scores.len() as i64);
            prop_assert!(summary.average_rating >= 1.0);
            prop_assert!(summary.average_rating <= 5.0);
        }
    }
}
