// src/services/geometry.rs

use crate::models::building::{DoorSide, Rect};

/// Comprimento mínimo de borda compartilhada para considerar duas zonas conectadas.
/// É também o espaço que cada porta ocupa.
pub const MIN_CONNECTION_LENGTH: i32 = 2;
pub const DOOR_WIDTH: i32 = 2;

/// Contato entre duas zonas: `side` é o lado de `r1` tocado por `r2`, e
/// `[start, end)` o trecho compartilhado no eixo paralelo a esse lado.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Intersection {
    pub side: DoorSide,
    pub start: i32,
    pub end: i32,
}

impl Intersection {
    pub fn length(&self) -> i32 {
        self.end - self.start
    }
}

fn shared_span(a_start: i32, a_end: i32, b_start: i32, b_end: i32) -> Option<(i32, i32)> {
    let start = a_start.max(b_start);
    let end = a_end.min(b_end);
    (end > start).then_some((start, end))
}

/// Só há interseção quando uma borda de `r1` encosta exatamente numa borda de `r2`
/// e o trecho em comum tem comprimento positivo. Proximidade não conta.
pub fn intersection(r1: &Rect, r2: &Rect) -> Option<Intersection> {
    let candidates = [
        (r1.right() == r2.x, DoorSide::Right),
        (r2.right() == r1.x, DoorSide::Left),
        (r1.bottom() == r2.y, DoorSide::Bottom),
        (r2.bottom() == r1.y, DoorSide::Top),
    ];

    candidates.into_iter().find_map(|(touches, side)| {
        if !touches {
            return None;
        }
        let (start, end) = match side {
            DoorSide::Left | DoorSide::Right => shared_span(r1.y, r1.bottom(), r2.y, r2.bottom())?,
            DoorSide::Top | DoorSide::Bottom => shared_span(r1.x, r1.right(), r2.x, r2.right())?,
        };
        Some(Intersection { side, start, end })
    })
}

/// Comprimento do contato (0 quando não há).
pub fn intersection_length(r1: &Rect, r2: &Rect) -> i32 {
    intersection(r1, r2).map(|i| i.length()).unwrap_or(0)
}

/// Teste AABB estrito: bordas que apenas se tocam NÃO sobrepõem.
pub fn overlap(r1: &Rect, r2: &Rect) -> bool {
    r1.x < r2.right() && r2.x < r1.right() && r1.y < r2.bottom() && r2.y < r1.bottom()
}

/// Une intervalos `[start, end)` que se sobrepõem ou se encostam.
pub fn merge_segments(mut segments: Vec<(i32, i32)>) -> Vec<(i32, i32)> {
    segments.retain(|(start, end)| end > start);
    segments.sort_unstable();

    let mut merged: Vec<(i32, i32)> = Vec::with_capacity(segments.len());
    for (start, end) in segments {
        match merged.last_mut() {
            Some(last) if start <= last.1 => last.1 = last.1.max(end),
            _ => merged.push((start, end)),
        }
    }
    merged
}

/// Trechos livres de `[span_start, span_end)` depois de remover os ocupados (já unidos).
pub fn free_segments(span: (i32, i32), occupied: &[(i32, i32)]) -> Vec<(i32, i32)> {
    let (span_start, span_end) = span;
    let mut free = Vec::new();
    let mut cursor = span_start;

    for &(start, end) in occupied {
        let start = start.max(span_start);
        let end = end.min(span_end);
        if end <= start {
            continue;
        }
        if start > cursor {
            free.push((cursor, start));
        }
        cursor = cursor.max(end);
    }
    if cursor < span_end {
        free.push((cursor, span_end));
    }
    free
}

/// Quantas portas cabem: cada uma precisa de `DOOR_WIDTH` unidades contínuas
/// dentro de um mesmo trecho livre.
pub fn door_slots(segments: &[(i32, i32)]) -> i32 {
    segments.iter().map(|(start, end)| (end - start) / DOOR_WIDTH).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn touching_right_edge_is_reported_from_first_rect() {
        let a = Rect::new(0, 0, 4, 4);
        let b = Rect::new(4, 1, 4, 4);

        let hit = intersection(&a, &b).unwrap();
        assert_eq!(hit.side, DoorSide::Right);
        assert_eq!((hit.start, hit.end), (1, 4));
        assert_eq!(hit.length(), 3);
    }

    #[test]
    fn intersection_is_symmetric_with_complementary_sides() {
        let pairs = [
            (Rect::new(0, 0, 4, 4), Rect::new(4, 0, 4, 4)),
            (Rect::new(0, 0, 4, 4), Rect::new(2, 4, 6, 2)),
            (Rect::new(5, 5, 3, 3), Rect::new(0, 6, 5, 5)),
            (Rect::new(5, 5, 3, 3), Rect::new(6, 0, 2, 5)),
        ];
        for (a, b) in pairs {
            let ab = intersection(&a, &b).unwrap();
            let ba = intersection(&b, &a).unwrap();
            assert_eq!(ab.side, ba.side.opposite());
            assert_eq!(ab.length(), ba.length());
        }
    }

    #[test]
    fn rects_at_the_integer_limit_do_not_panic_or_wrap() {
        let far = Rect::new(i32::MAX - 1, 0, 4, 4);
        let near = Rect::new(0, 0, 10, 10);

        assert_eq!(far.right(), i32::MAX);
        assert_eq!(intersection_length(&far, &near), 0);
        assert!(!overlap(&far, &near));
        assert!(!overlap(&near, &far));
    }

    #[test]
    fn distant_or_corner_only_rects_do_not_intersect() {
        let a = Rect::new(0, 0, 4, 4);
        // Alinhado no eixo, mas a distância
        assert!(intersection(&a, &Rect::new(5, 0, 4, 4)).is_none());
        // Apenas o canto encosta
        assert!(intersection(&a, &Rect::new(4, 4, 4, 4)).is_none());
        assert!(intersection(&Rect::new(4, 4, 4, 4), &a).is_none());
    }

    #[test]
    fn shared_edge_is_not_an_overlap() {
        let a = Rect::new(0, 0, 4, 4);
        let b = Rect::new(4, 0, 4, 4);
        assert!(!overlap(&a, &b));
        assert!(!overlap(&b, &a));
    }

    #[test]
    fn area_intersection_is_an_overlap() {
        let a = Rect::new(0, 0, 4, 4);
        assert!(overlap(&a, &Rect::new(3, 3, 4, 4)));
        assert!(overlap(&a, &Rect::new(1, 1, 2, 2)));
        assert!(overlap(&a, &a));
    }

    #[test]
    fn merges_touching_and_nested_segments() {
        let merged = merge_segments(vec![(6, 8), (0, 2), (1, 3), (3, 4), (7, 7)]);
        assert_eq!(merged, vec![(0, 4), (6, 8)]);
    }

    #[test]
    fn free_segments_subtract_occupied_parts() {
        let free = free_segments((0, 10), &[(2, 4), (7, 12)]);
        assert_eq!(free, vec![(0, 2), (4, 7)]);
        assert_eq!(door_slots(&free), 2);
    }

    #[test]
    fn door_slots_do_not_span_segments() {
        // 1 + 1 unidades livres não formam uma porta
        assert_eq!(door_slots(&[(0, 1), (3, 4)]), 0);
        assert_eq!(door_slots(&[(0, 5)]), 2);
    }
}
