pub mod shared {
    pub mod config;
    pub mod constants;
    pub mod detection;
    pub mod face_crop;
    pub mod frame;
    pub mod frame_batch;
    pub mod onnx_session;
    pub mod video_metadata;
}

pub mod video {
    pub mod domain {
        pub mod frame_sampler;
        pub mod image_writer;
        pub mod video_reader;
    }
    pub mod infrastructure;
}

pub mod detection {
    pub mod domain {
        pub mod face_cropper;
        pub mod face_detector;
        pub mod tile_geometry;
        pub mod tiler;
    }
    pub mod infrastructure;
}

pub mod classification {
    pub mod domain {
        pub mod face_batch;
        pub mod face_classifier;
    }
    pub mod infrastructure;
}

pub mod pipeline {
    pub mod face_extractor;
    pub mod predict_video_use_case;
    pub mod prediction_executor;
    pub mod prediction_writer;
    pub mod result_filter;
    pub mod infrastructure {
        pub mod threaded_prediction_executor;
    }
}

#[cfg(test)]
pub(crate) mod testing;
