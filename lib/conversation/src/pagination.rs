//! Pagination of venue search results.
//!
//! Pure functions: deterministic output for identical inputs, no transport
//! involvement. Item numbering is the 1-based absolute position in the full
//! result list, continuous across pages, so the number a user replies with
//! is independent of which page they are looking at.

use venuewatch_directory::Venue;

/// Number of venues shown per page.
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Header shown above the first page only.
const PAGE_HEADER: &str = "Select venue:\n";

/// Hint appended whenever more pages remain.
const NEXT_PAGE_HINT: &str = "\nIf you can't find your venue here please reply \"next\"";

/// Fallback text for venues without a rating.
const NO_RATING: &str = "no rating";

/// Slices one page out of the result list.
///
/// Returns the displayed slice and whether further pages remain. A page
/// past the end of the list yields an empty slice.
#[must_use]
pub fn paginate(venues: &[Venue], page_num: usize, page_size: usize) -> (&[Venue], bool) {
    let start = page_num.saturating_mul(page_size).min(venues.len());
    let end = start.saturating_add(page_size).min(venues.len());
    let has_more = page_num
        .saturating_mul(page_size)
        .saturating_add(page_size)
        < venues.len();
    (&venues[start..end], has_more)
}

/// Renders one page of the result list as a selection prompt.
///
/// Page 0 carries the header; later pages continue the numbering without
/// repeating it. When further pages exist, the output ends with a hint to
/// reply "next".
#[must_use]
pub fn render_page(venues: &[Venue], page_num: usize, page_size: usize) -> String {
    let (page, has_more) = paginate(venues, page_num, page_size);

    let mut prompt = if page_num == 0 {
        String::from(PAGE_HEADER)
    } else {
        String::new()
    };

    let first_index = page_num * page_size + 1;
    for (index, venue) in (first_index..).zip(page) {
        let rating = match venue.rating {
            Some(score) => score.to_string(),
            None => NO_RATING.to_string(),
        };
        prompt.push_str(&format!(
            "{index}. {} - {rating} - {}\n",
            venue.title.trim(),
            venue.description.trim(),
        ));
    }

    if has_more {
        prompt.push_str(NEXT_PAGE_HINT);
    }

    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    fn venues(count: usize) -> Vec<Venue> {
        (1..=count)
            .map(|n| Venue {
                title: format!("Venue {n}"),
                description: format!("Description {n}"),
                rating: if n % 2 == 0 { Some(n as f32 / 2.0) } else { None },
                track_id: format!("venue-{n}"),
            })
            .collect()
    }

    #[test]
    fn pages_partition_the_list_exactly_once() {
        let all = venues(25);
        let mut seen = Vec::new();
        let mut page_num = 0;

        loop {
            let (page, has_more) = paginate(&all, page_num, 10);
            seen.extend(page.iter().cloned());
            if !has_more {
                break;
            }
            page_num += 1;
        }

        assert_eq!(seen, all);
        assert_eq!(page_num, 2);
    }

    #[test]
    fn has_more_false_on_exact_boundary() {
        let all = venues(20);
        let (page, has_more) = paginate(&all, 1, 10);
        assert_eq!(page.len(), 10);
        assert!(!has_more);
    }

    #[test]
    fn page_past_end_is_empty() {
        let all = venues(5);
        let (page, has_more) = paginate(&all, 3, 10);
        assert!(page.is_empty());
        assert!(!has_more);
    }

    #[test]
    fn indices_are_absolute_across_pages() {
        let all = venues(25);
        let rendered = render_page(&all, 1, 10);

        assert!(rendered.contains("11. Venue 11"));
        assert!(rendered.contains("20. Venue 20"));
        assert!(!rendered.contains("21. Venue 21"));
        assert!(!rendered.contains("10. Venue 10"));
    }

    #[test]
    fn first_page_has_header_and_hint() {
        let all = venues(15);
        let rendered = render_page(&all, 0, 10);

        assert!(rendered.starts_with("Select venue:\n"));
        assert!(rendered.contains("1. Venue 1"));
        assert!(rendered.contains("10. Venue 10"));
        assert!(rendered.ends_with("please reply \"next\""));
    }

    #[test]
    fn last_page_has_no_header_and_no_hint() {
        let all = venues(15);
        let rendered = render_page(&all, 1, 10);

        assert!(!rendered.starts_with("Select venue:"));
        assert!(rendered.contains("11. Venue 11"));
        assert!(rendered.contains("15. Venue 15"));
        assert!(!rendered.contains("next"));
    }

    #[test]
    fn missing_rating_renders_fallback_text() {
        let all = venues(1);
        let rendered = render_page(&all, 0, 10);
        assert!(rendered.contains("1. Venue 1 - no rating - Description 1"));
    }

    #[test]
    fn titles_and_descriptions_are_trimmed() {
        let all = vec![Venue {
            title: "  Padded Place  ".to_string(),
            description: " spacious \n".to_string(),
            rating: Some(7.5),
            track_id: "venue-padded".to_string(),
        }];
        let rendered = render_page(&all, 0, 10);
        assert!(rendered.contains("1. Padded Place - 7.5 - spacious\n"));
    }
}
