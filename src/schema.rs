// Written against the tables created in `Database::init_schema`.
// Table names keep their legacy spelling so existing stores open unchanged.

diesel::table! {
    #[sql_name = "AnimalChannelList"]
    animal_channel_list (id) {
        id -> Integer,
        compound_animal -> Nullable<Text>,
        channel -> Nullable<Text>,
    }
}

diesel::table! {
    #[sql_name = "DataFiles"]
    data_files (animal, file_name) {
        animal -> Text,
        file_name -> Text,
        file_path -> Nullable<Text>,
        file_start -> Nullable<Timestamp>,
        chan_number -> Nullable<Integer>,
        chan_idx -> Nullable<Integer>,
        sample_freq -> Nullable<Integer>,
        file_length -> Nullable<BigInt>,
        video_file_path -> Nullable<Text>,
        reviewed -> Bool,
    }
}

diesel::table! {
    #[sql_name = "unusedDataFiles"]
    unused_data_files (animal, file_name) {
        animal -> Text,
        file_name -> Text,
        file_path -> Nullable<Text>,
        file_start -> Nullable<Timestamp>,
        chan_number -> Nullable<Integer>,
        chan_idx -> Nullable<Integer>,
        sample_freq -> Nullable<Integer>,
        file_length -> Nullable<BigInt>,
        video_file_path -> Nullable<Text>,
    }
}

diesel::table! {
    #[sql_name = "AlgorithmParameters"]
    algorithm_parameters (animal) {
        animal -> Text,
        window_size -> Integer,
        no_groups_per_epoch -> Integer,
        look_ahead -> Integer,
        threshold -> Double,
        proxthreshold -> Integer,
        durationthreshold -> Double,
        ampthreshold -> Double,
        spikewindow -> Integer,
        slope_scaling_factor -> Double,
        min_no_spikes -> Integer,
        min_spikerate -> Double,
    }
}

diesel::table! {
    #[sql_name = "Events"]
    events (animal, filename, event_start) {
        animal -> Text,
        filename -> Text,
        filepath -> Nullable<Text>,
        event_start -> Double,
        event_end -> Nullable<Double>,
        racine_score -> Nullable<Integer>,
        file_start -> Nullable<Timestamp>,
        meta_text -> Nullable<Text>,
        channel_no -> Nullable<Integer>,
        event_type -> Nullable<Text>,
        how_found -> Nullable<Text>,
        edit_status -> Nullable<Text>,
    }
}
