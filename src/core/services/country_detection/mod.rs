pub mod country_detector;
pub mod detection_layer;
pub mod geolocation_layer;
pub mod locale_layer;
pub mod timezone_layer;
