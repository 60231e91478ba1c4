use serde::{Deserialize, Serialize};

/// A user's review of a film.
///
/// `useful` is the net score of like/dislike votes from readers. It starts at
/// zero and has no floor or ceiling.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    /// Storage-assigned identifier (0 until persisted)
    #[serde(rename = "reviewId")]
    pub id: i64,
    pub content: String,
    pub is_positive: bool,
    /// Review author
    pub user_id: i64,
    /// Reviewed film
    pub film_id: i64,
    #[serde(default)]
    pub useful: i64,
}

impl Review {
    pub fn like(&mut self) {
        self.useful += 1;
    }

    pub fn dislike(&mut self) {
        self.useful -= 1;
    }

    pub fn remove_like(&mut self) {
        self.useful -= 1;
    }

    pub fn remove_dislike(&mut self) {
        self.useful += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn review() -> Review {
        Review {
            id: 1,
            content: "worth a watch".into(),
            is_positive: true,
            user_id: 2,
            film_id: 3,
            useful: 0,
        }
    }

    #[test]
    fn test_like_then_remove_like_round_trips() {
        let mut r = review();
        r.like();
        assert_eq!(r.useful, 1);
        r.remove_like();
        assert_eq!(r.useful, 0);
    }

    #[test]
    fn test_usefulness_may_go_negative() {
        let mut r = review();
        r.dislike();
        r.dislike();
        assert_eq!(r.useful, -2);
    }
}
