//! Static table of the road signs the detection model was trained on.

/// Display text for one sign class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignInfo {
    pub name: &'static str,
    pub description: &'static str,
}

/// Returned for class ids the catalog does not know.
pub const UNKNOWN_SIGN: SignInfo = SignInfo {
    name: "Unknown Sign",
    description: "Sign not recognized",
};

/// GTSRB classes, indexed by the model's class id.
const GTSRB_SIGNS: [SignInfo; 43] = [
    SignInfo {
        name: "Speed limit (20km/h)",
        description: "Maximum speed limit of 20 kilometers per hour. Typically found in highly pedestrianized areas or zones requiring extra caution.",
    },
    SignInfo {
        name: "Speed limit (30km/h)",
        description: "Maximum speed limit of 30 kilometers per hour. Common in residential areas and school zones.",
    },
    SignInfo {
        name: "Speed limit (50km/h)",
        description: "Maximum speed limit of 50 kilometers per hour. Standard speed limit in urban areas.",
    },
    SignInfo {
        name: "Speed limit (60km/h)",
        description: "Maximum speed limit of 60 kilometers per hour. Often found on major urban roads.",
    },
    SignInfo {
        name: "Speed limit (70km/h)",
        description: "Maximum speed limit of 70 kilometers per hour. Typical for roads transitioning between urban and rural areas.",
    },
    SignInfo {
        name: "Speed limit (80km/h)",
        description: "Maximum speed limit of 80 kilometers per hour. Common on rural roads and highways.",
    },
    SignInfo {
        name: "End of speed limit (80km/h)",
        description: "Indicates the end of the 80km/h speed limit zone. Return to standard speed limits.",
    },
    SignInfo {
        name: "Speed limit (100km/h)",
        description: "Maximum speed limit of 100 kilometers per hour. Typically found on highways and motorways.",
    },
    SignInfo {
        name: "Speed limit (120km/h)",
        description: "Maximum speed limit of 120 kilometers per hour. Common on major highways and motorways.",
    },
    SignInfo {
        name: "No passing",
        description: "Overtaking or passing other vehicles is prohibited. Stay in your lane.",
    },
    SignInfo {
        name: "No passing for vehicles over 3.5 metric tons",
        description: "Heavy vehicles weighing more than 3.5 metric tons are not allowed to overtake other vehicles.",
    },
    SignInfo {
        name: "Right-of-way at the next intersection",
        description: "You have priority at the upcoming intersection. Other vehicles must yield to you.",
    },
    SignInfo {
        name: "Priority road",
        description: "You are on a priority road. You have right of way at intersections.",
    },
    SignInfo {
        name: "Yield",
        description: "You must give way to other traffic. Stop if necessary and proceed only when safe.",
    },
    SignInfo {
        name: "Stop",
        description: "Come to a complete stop. Proceed only when safe and after yielding to other traffic.",
    },
    SignInfo {
        name: "No vehicles",
        description: "No vehicles of any kind are permitted beyond this point.",
    },
    SignInfo {
        name: "Vehicles over 3.5 metric tons prohibited",
        description: "Heavy vehicles exceeding 3.5 metric tons are not allowed on this road.",
    },
    SignInfo {
        name: "No entry",
        description: "Entry forbidden for all vehicles. Do not enter.",
    },
    SignInfo {
        name: "General caution",
        description: "Warning for a general hazard ahead. Proceed with increased attention.",
    },
    SignInfo {
        name: "Dangerous curve to the left",
        description: "Sharp bend ahead to the left. Reduce speed and prepare to turn.",
    },
    SignInfo {
        name: "Dangerous curve to the right",
        description: "Sharp bend ahead to the right. Reduce speed and prepare to turn.",
    },
    SignInfo {
        name: "Double curve",
        description: "Series of bends ahead. First curve could be either left or right. Reduce speed.",
    },
    SignInfo {
        name: "Bumpy road",
        description: "Road surface is uneven ahead. Reduce speed and prepare for bumps.",
    },
    SignInfo {
        name: "Slippery road",
        description: "Road surface may be slippery. Reduce speed and increase following distance.",
    },
    SignInfo {
        name: "Road narrows on the right",
        description: "The road becomes narrower on the right side ahead. Adjust position accordingly.",
    },
    SignInfo {
        name: "Road work",
        description: "Construction or maintenance work ahead. Reduce speed and watch for workers.",
    },
    SignInfo {
        name: "Traffic signals",
        description: "Traffic light ahead. Prepare to stop if the signal is red.",
    },
    SignInfo {
        name: "Pedestrians",
        description: "Pedestrian crossing ahead. Watch for people crossing the road.",
    },
    SignInfo {
        name: "Children crossing",
        description: "School zone or playground area. Watch for children crossing the road.",
    },
    SignInfo {
        name: "Bicycles crossing",
        description: "Bicycle crossing ahead. Watch for cyclists crossing or joining the road.",
    },
    SignInfo {
        name: "Beware of ice/snow",
        description: "Risk of ice or snow on the road. Adjust driving style for winter conditions.",
    },
    SignInfo {
        name: "Wild animals crossing",
        description: "Wildlife crossing area ahead. Watch for animals on the road.",
    },
    SignInfo {
        name: "End of all speed and passing limits",
        description: "Previous speed and passing restrictions end. Standard traffic rules apply.",
    },
    SignInfo {
        name: "Turn right ahead",
        description: "Mandatory right turn ahead. Prepare to turn right at the intersection.",
    },
    SignInfo {
        name: "Turn left ahead",
        description: "Mandatory left turn ahead. Prepare to turn left at the intersection.",
    },
    SignInfo {
        name: "Ahead only",
        description: "Must proceed straight ahead. No turning allowed.",
    },
    SignInfo {
        name: "Go straight or right",
        description: "Must either continue straight or turn right. No left turn allowed.",
    },
    SignInfo {
        name: "Go straight or left",
        description: "Must either continue straight or turn left. No right turn allowed.",
    },
    SignInfo {
        name: "Keep right",
        description: "Stay on the right side of the road or obstacle ahead.",
    },
    SignInfo {
        name: "Keep left",
        description: "Stay on the left side of the road or obstacle ahead.",
    },
    SignInfo {
        name: "Roundabout mandatory",
        description: "Must enter and follow the roundabout in the indicated direction.",
    },
    SignInfo {
        name: "End of no passing",
        description: "End of no-overtaking zone. Passing other vehicles is now allowed.",
    },
    SignInfo {
        name: "End of no passing by vehicles over 3.5 metric tons",
        description: "End of no-overtaking zone for heavy vehicles. Trucks may now pass other vehicles.",
    },
];

#[derive(Debug, Clone)]
pub struct SignCatalog {
    signs: Vec<SignInfo>,
}

impl SignCatalog {
    pub fn gtsrb() -> Self {
        Self {
            signs: GTSRB_SIGNS.to_vec(),
        }
    }

    pub fn lookup(&self, class_id: usize) -> SignInfo {
        self.signs.get(class_id).copied().unwrap_or(UNKNOWN_SIGN)
    }

    /// Reverse lookup by display name, first match wins.
    pub fn class_id_for_name(&self, name: &str) -> Option<usize> {
        self.signs.iter().position(|sign| sign.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &SignInfo)> {
        self.signs.iter().enumerate()
    }
}
