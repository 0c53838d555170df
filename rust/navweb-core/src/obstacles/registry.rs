use super::definition::{ObstacleDefinition, ObstacleType, DEFAULT_TOLL};

pub const PRINCE_ALI_RESCUE: &str = "Prince Ali Rescue";

/// Doors, gates and the odd special obstacle every catalog starts from.
pub fn builtin_obstacles() -> Vec<ObstacleDefinition> {
    let mut v = Vec::new();
    let doors: &[(&str, i32, i32)] = &[
        ("Wooden Door", 1535, 1534),
        ("Wooden Door", 1530, 1531),
        ("Wooden Door", 1533, 1532),
        ("Lumbridge Castle Door", 1543, 1544),
        ("Lumbridge Castle Door", 1545, 1546),
        ("Bank Door", 1804, 1805),
        ("Bank Door", 11775, 11776),
        ("Bank Door", 24381, 24382),
        ("Varrock Door", 1540, 1541),
        ("Varrock Palace Door", 1548, 1549),
        ("Falador Door", 1558, 1559),
    ];
    for &(name, closed, open) in doors {
        v.push(ObstacleDefinition::door(name, closed, open));
    }

    for (closed, open) in [(2882, 2883), (2881, 2880)] {
        v.push(ObstacleDefinition::toll_gate("Al Kharid Gate", closed, open, DEFAULT_TOLL, Some(PRINCE_ALI_RESCUE)));
    }

    let gates: &[(&str, i32, i32)] = &[
        ("Gate", 1551, 1552),
        ("Gate", 1553, 1554),
        ("Gate", 1555, 1556),
        ("Gate", 1596, 1597),
        ("Farm Gate", 7136, 7137),
        ("Farm Gate", 12985, 12986),
        ("Garden Gate", 2050, 2051),
    ];
    for &(name, closed, open) in gates {
        v.push(ObstacleDefinition::gate(name, closed, open));
    }

    v.push(ObstacleDefinition::new("Wilderness Ditch", ObstacleType::Other, vec![23271], "Cross", 3).with_states(23271, -1));
    v.push(ObstacleDefinition::new("Trapdoor", ObstacleType::Other, vec![1579, 1580], "Open", 3).with_states(1579, 1580));
    v
}
